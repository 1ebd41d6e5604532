//! CSV sink benchmark: open-append-close per row.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ids_capture::features::FeatureRecord;
use ids_capture::storage::FeatureSink;
use tempfile::tempdir;

fn sample() -> FeatureRecord {
    FeatureRecord {
        packet_length: 1514,
        inter_arrival_time: 0.000125,
        ttl: 64,
        is_tcp: 1,
        is_udp: 0,
        is_icmp: 0,
        src_port: 51544,
        dst_port: 443,
        syn_flag: 0,
        ack_flag: 1,
        fin_flag: 0,
        rst_flag: 0,
        is_well_known_port: 1,
    }
}

fn bench_append(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.csv");
    let mut sink = FeatureSink::new(&path).unwrap();
    let record = sample();

    c.bench_function("csv_sink_append", |b| b.iter(|| sink.append(black_box(&record)).unwrap()));
}

fn bench_fresh_sink(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let record = sample();
    let mut n = 0u64;

    c.bench_function("csv_sink_new_and_first_append", |b| {
        b.iter(|| {
            n += 1;
            let mut sink = FeatureSink::new(dir.path().join(format!("f{}.csv", n))).unwrap();
            sink.append(black_box(&record)).unwrap()
        })
    });
}

criterion_group!(benches, bench_append, bench_fresh_sink);
criterion_main!(benches);
