//! ids-capture: live packet capture to per-packet intrusion-detection features.
//!
//! Modular structure:
//! - [`collectors`]: Packet sources (libpcap live/offline, in-memory) and frame decoding
//! - [`features`]: Raw packet record → fixed-width feature record
//! - [`storage`]: Append-only CSV feature table, JSON-lines inspection sink
//! - [`sniffer`]: Capture loop tying source, extractor and sink together
//! - [`logging`]: Structured logging

pub mod config;
pub mod error;
pub mod collectors;
pub mod features;
pub mod storage;
pub mod sniffer;
pub mod logging;

pub use config::SnifferConfig;
pub use collectors::{CapturedPacket, LinkType, PacketSource, SourceEvent};
pub use error::{CaptureError, PacketError, SinkError};
pub use features::{FeatureExtractor, FeatureRecord, RawPacketRecord, FEATURE_COLUMNS};
pub use storage::{FeatureSink, RecordSink};
pub use sniffer::{PacketSniffer, SessionReport, StopHandle};
pub use logging::StructuredLogger;
