//! ids-capture entrypoint: capture packets, derive features, append them to
//! the CSV table (or print them in log mode) until the packet limit is
//! reached, the source ends, or Ctrl+C is pressed.

use ids_capture::{collectors, config::SnifferConfig, logging::StructuredLogger, sniffer, CaptureError, StopHandle};
use std::path::PathBuf;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("IDS_CAPTURE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = SnifferConfig::load(&config_path)?;

    StructuredLogger::init(config.log.json, &config.log.level);

    if !collectors::CAPTURE_SUPPORTED {
        let e = CaptureError::Unavailable;
        error!(error = %e, "cannot capture packets: build with `cargo build --release --features pcap`");
        eprintln!("ids-capture: {}", e);
        return Err(e.into());
    }

    info!(
        interface = %config.interface,
        packet_limit = config.packet_limit,
        output = %config.output.path.display(),
        mode = ?config.output.mode,
        "ids-capture starting (Ctrl+C to stop)"
    );

    let stop = StopHandle::new();
    let handler_stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_stop.stop()) {
        tracing::warn!(error = %e, "cannot install Ctrl+C handler");
    }

    match sniffer::run_configured(&config, stop) {
        Ok(report) => {
            info!(
                observed = report.observed,
                forwarded = report.forwarded,
                skipped = report.skipped_malformed + report.skipped_sink,
                "ids-capture stopping"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "capture session aborted");
            Err(e.into())
        }
    }
}
