//! Capture session configuration, loaded from a JSON file.

use crate::error::ConfigError;
use crate::features::FEATURE_COLUMNS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnifferConfig {
    /// Interface to capture on
    pub interface: String,
    /// Packets to observe before the session ends; 0 = until stopped
    pub packet_limit: usize,
    /// Where feature records go
    pub output: OutputConfig,
    /// libpcap tuning and capture threading
    pub capture: CaptureConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Append rows to the CSV feature table
    Csv,
    /// Print each record as a JSON line, persist nothing
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub mode: OutputMode,
    pub path: PathBuf,
    /// Column list for the CSV header and rows
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Replay this pcap file instead of capturing live
    pub read_file: Option<PathBuf>,
    pub snaplen: i32,
    pub promiscuous: bool,
    /// Read timeout; bounds how long a stop request can go unnoticed
    pub timeout_ms: i32,
    /// Capacity of the capture → writer queue; 0 runs everything on one thread
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            interface: "eth0".to_string(),
            packet_limit: 1500,
            output: OutputConfig::default(),
            capture: CaptureConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Csv,
            path: PathBuf::from("data").join("features.csv"),
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            read_file: None,
            snaplen: 65535,
            promiscuous: true,
            timeout_ms: 500,
            queue_capacity: 0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl SnifferConfig {
    /// Load from JSON file if present; otherwise return default.
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
