//! Error taxonomy for the capture pipeline.
//!
//! Malformed field values never show up here: the extractor substitutes
//! defaults for them. What remains is split by blast radius:
//! [`PacketError`] costs one packet, [`CaptureError`] ends the session.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to persist a feature record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot create sink directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open sink file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write sink file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unknown feature column: {0}")]
    UnknownColumn(String),

    #[error("sink needs at least one column")]
    NoColumns,

    #[error("cannot emit feature record: {0}")]
    Emit(#[from] std::io::Error),
}

/// Failure confined to a single packet. The capture loop logs it and moves on.
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("cannot decode frame: {0}")]
    Decode(String),

    #[error("unsupported link type {0}")]
    UnsupportedLink(i32),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl PacketError {
    /// Short label used as the `kind` field in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PacketError::Decode(_) | PacketError::UnsupportedLink(_) => "malformed_packet",
            PacketError::Sink(_) => "sink_write",
        }
    }
}

/// Session-level failure: the source (or the session setup) is unusable.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot open packet source {target}: {reason}")]
    Open { target: String, reason: String },

    #[error("packet source failed: {0}")]
    Source(String),

    #[error("packet capture support not compiled in (rebuild with --features pcap)")]
    Unavailable,

    #[error("cannot set up sink: {0}")]
    Sink(#[from] SinkError),

    #[error("capture worker terminated abnormally")]
    Worker,
}

/// Configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = CaptureError> = std::result::Result<T, E>;
