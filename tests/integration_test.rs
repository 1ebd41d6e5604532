//! Integration test: config load, sink selection, session setup without a capture backend.

use ids_capture::{
    config::{OutputMode, SnifferConfig},
    error::ConfigError,
    features::FEATURE_COLUMNS,
    sniffer, StopHandle,
};
use std::path::Path;

#[test]
fn config_load_default() {
    let c = SnifferConfig::load(Path::new("nonexistent.json")).unwrap();
    assert_eq!(c.packet_limit, 1500);
    assert_eq!(c.output.mode, OutputMode::Csv);
    assert_eq!(c.output.columns, FEATURE_COLUMNS);
    assert_eq!(c.capture.queue_capacity, 0);
    assert!(c.capture.read_file.is_none());
}

#[test]
fn config_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "interface": "wlan0", "output": { "mode": "log" }, "capture": { "queue_capacity": 256 } }"#,
    )
    .unwrap();

    let c = SnifferConfig::load(&path).unwrap();
    assert_eq!(c.interface, "wlan0");
    assert_eq!(c.output.mode, OutputMode::Log);
    assert_eq!(c.output.columns.len(), FEATURE_COLUMNS.len());
    assert_eq!(c.capture.queue_capacity, 256);
    assert_eq!(c.capture.snaplen, 65535);
    assert_eq!(c.packet_limit, 1500);
    assert_eq!(c.log.level, "info");
}

#[test]
fn config_invalid_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(SnifferConfig::load(&path), Err(ConfigError::Parse { .. })));
}

#[test]
fn configured_session_rejects_bad_columns_before_capture() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SnifferConfig::default();
    config.output.path = dir.path().join("features.csv");
    config.output.columns = vec!["dst_port".into(), "bogus".into()];

    let err = sniffer::run_configured(&config, StopHandle::new()).unwrap_err();
    assert!(matches!(err, ids_capture::CaptureError::Sink(_)), "{:?}", err);
}

#[cfg(not(feature = "pcap"))]
#[test]
fn configured_session_without_capture_backend() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SnifferConfig::default();
    config.output.path = dir.path().join("nested").join("features.csv");

    let err = sniffer::run_configured(&config, StopHandle::new()).unwrap_err();
    assert!(matches!(err, ids_capture::CaptureError::Unavailable));
    assert!(err.to_string().contains("--features pcap"), "{}", err);
    // The sink was still set up, creating its directory.
    assert!(dir.path().join("nested").is_dir());
}

#[test]
fn capture_support_matches_build_features() {
    assert_eq!(ids_capture::collectors::CAPTURE_SUPPORTED, cfg!(feature = "pcap"));
}
