//! Feature extraction over well-formed, partial and malformed raw records.

use ids_capture::features::{FeatureExtractor, FeatureRecord, FieldValue, RawPacketRecord, FEATURE_COLUMNS, NO_PORT};
use serde_json::json;

fn extract(value: serde_json::Value) -> FeatureRecord {
    let raw: RawPacketRecord = serde_json::from_value(value).unwrap();
    FeatureExtractor::new().extract(&raw)
}

#[test]
fn empty_record_gets_all_defaults() {
    let f = extract(json!({}));
    assert_eq!(
        f,
        FeatureRecord {
            packet_length: 0,
            inter_arrival_time: 0.0,
            ttl: 0,
            is_tcp: 0,
            is_udp: 0,
            is_icmp: 0,
            src_port: -1,
            dst_port: -1,
            syn_flag: 0,
            ack_flag: 0,
            fin_flag: 0,
            rst_flag: 0,
            is_well_known_port: 0,
        }
    );
    assert_eq!(f.values().len(), FEATURE_COLUMNS.len());
    for column in FEATURE_COLUMNS {
        assert!(f.value(column).is_some(), "missing {}", column);
    }
}

#[test]
fn full_tcp_record() {
    let f = extract(json!({
        "timestamp": "2024-05-01T12:00:00Z",
        "packet_length": "1514",
        "highest_layer": "TLS",
        "transport_layer": "TCP",
        "src_ip": "10.0.0.2",
        "dst_ip": "93.184.216.34",
        "src_port": "51544",
        "dst_port": 443,
        "tcp_flags": "0x0012",
        "window_size": "64240",
        "ttl": "64",
        "inter_arrival_time": 0.25
    }));
    assert_eq!(f.packet_length, 1514);
    assert_eq!(f.inter_arrival_time, 0.25);
    assert_eq!(f.ttl, 64);
    assert_eq!((f.is_tcp, f.is_udp, f.is_icmp), (1, 0, 0));
    assert_eq!((f.src_port, f.dst_port), (51544, 443));
    assert_eq!((f.syn_flag, f.ack_flag, f.fin_flag, f.rst_flag), (1, 1, 0, 0));
    assert_eq!(f.is_well_known_port, 1);
}

#[test]
fn ack_psh_flags_decode() {
    let f = extract(json!({ "tcp_flags": "0x18" }));
    assert_eq!(f.ack_flag, 1);
    assert_eq!(f.syn_flag, 0);
    assert_eq!(f.fin_flag, 0);
    assert_eq!(f.rst_flag, 0);
}

#[test]
fn flags_without_prefix_and_fin_rst() {
    let f = extract(json!({ "tcp_flags": "05" }));
    assert_eq!((f.syn_flag, f.ack_flag, f.fin_flag, f.rst_flag), (0, 0, 1, 1));

    let f = extract(json!({ "tcp_flags": "0X02" }));
    assert_eq!(f.syn_flag, 1);
}

#[test]
fn bad_flags_mean_no_flags() {
    for flags in ["zz", "", "0x", "0x1g", "+", "0x__12", "0x12_", "_12", "1__2", "0x+12", "--12"] {
        let f = extract(json!({ "tcp_flags": flags }));
        assert_eq!((f.syn_flag, f.ack_flag, f.fin_flag, f.rst_flag), (0, 0, 0, 0), "{:?}", flags);
    }
}

#[test]
fn signed_and_separated_flags() {
    for flags in ["+0x12", "0x1_2", "0x_12", " +12 ", "0X0_0_1_2"] {
        let f = extract(json!({ "tcp_flags": flags }));
        assert_eq!((f.syn_flag, f.ack_flag, f.fin_flag, f.rst_flag), (1, 1, 0, 0), "{:?}", flags);
    }
}

#[test]
fn oversized_flags_keep_low_bits() {
    let f = extract(json!({ "tcp_flags": "0x10000000000000012" }));
    assert_eq!((f.syn_flag, f.ack_flag, f.fin_flag, f.rst_flag), (1, 1, 0, 0));

    let f = extract(json!({ "tcp_flags": "0xffffffffffffffffffff0005" }));
    assert_eq!((f.syn_flag, f.ack_flag, f.fin_flag, f.rst_flag), (0, 0, 1, 1));
}

#[test]
fn negative_flags_use_twos_complement() {
    // -0x12 is ...1110_1110: SYN and RST set, FIN and ACK clear.
    let f = extract(json!({ "tcp_flags": "-0x12" }));
    assert_eq!((f.syn_flag, f.ack_flag, f.fin_flag, f.rst_flag), (1, 0, 0, 1));
}

#[test]
fn protocol_one_hot() {
    let tcp = extract(json!({ "transport_layer": "TCP" }));
    assert_eq!((tcp.is_tcp, tcp.is_udp, tcp.is_icmp), (1, 0, 0));

    let udp = extract(json!({ "transport_layer": "UDP" }));
    assert_eq!((udp.is_tcp, udp.is_udp, udp.is_icmp), (0, 1, 0));

    let icmp6 = extract(json!({ "transport_layer": "ICMPv6" }));
    assert_eq!((icmp6.is_tcp, icmp6.is_udp, icmp6.is_icmp), (0, 0, 1));

    let icmp = extract(json!({ "transport_layer": "ICMP" }));
    assert_eq!(icmp.is_icmp, 1);

    // Exact match only for TCP/UDP
    let lower = extract(json!({ "transport_layer": "tcp" }));
    assert_eq!((lower.is_tcp, lower.is_udp, lower.is_icmp), (0, 0, 0));

    let sctp = extract(json!({ "transport_layer": "SCTP" }));
    assert_eq!((sctp.is_tcp, sctp.is_udp, sctp.is_icmp), (0, 0, 0));
}

#[test]
fn well_known_port_requires_integer() {
    assert_eq!(extract(json!({ "dst_port": 80 })).is_well_known_port, 1);
    assert_eq!(extract(json!({ "dst_port": 0 })).is_well_known_port, 1);
    assert_eq!(extract(json!({ "dst_port": 1023 })).is_well_known_port, 1);
    assert_eq!(extract(json!({ "dst_port": 1024 })).is_well_known_port, 0);
    assert_eq!(extract(json!({ "dst_port": -5 })).is_well_known_port, 0);

    let text = extract(json!({ "dst_port": "80" }));
    assert_eq!(text.dst_port, 80);
    assert_eq!(text.is_well_known_port, 0);
}

#[test]
fn port_sentinel() {
    let f = extract(json!({ "src_port": "http", "dst_port": null }));
    assert_eq!(f.src_port, NO_PORT);
    assert_eq!(f.dst_port, NO_PORT);
    assert_ne!(f.dst_port, 0);
}

#[test]
fn garbage_numbers_default() {
    let f = extract(json!({
        "packet_length": "long",
        "ttl": "n/a",
        "inter_arrival_time": "soon",
        "transport_layer": null
    }));
    assert_eq!(f.packet_length, 0);
    assert_eq!(f.ttl, 0);
    assert_eq!(f.inter_arrival_time, 0.0);
    assert_eq!((f.is_tcp, f.is_udp, f.is_icmp), (0, 0, 0));
}

#[test]
fn numeric_coercions() {
    let raw = RawPacketRecord {
        packet_length: Some(FieldValue::Float(60.9)),
        ttl: Some(FieldValue::Text(" 128 ".into())),
        inter_arrival_time: Some(FieldValue::Int(2)),
        src_port: Some(FieldValue::Float(f64::NAN)),
        ..Default::default()
    };
    let f = FeatureExtractor::new().extract(&raw);
    assert_eq!(f.packet_length, 60);
    assert_eq!(f.ttl, 128);
    assert_eq!(f.inter_arrival_time, 2.0);
    assert_eq!(f.src_port, NO_PORT);
}

#[test]
fn extraction_is_deterministic() {
    let raw: RawPacketRecord = serde_json::from_value(json!({
        "packet_length": 74, "transport_layer": "UDP", "src_port": 5353, "dst_port": 53
    }))
    .unwrap();
    let extractor = FeatureExtractor::new();
    assert_eq!(extractor.extract(&raw), extractor.extract(&raw));
}
