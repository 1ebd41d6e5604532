//! Per-packet feature extraction: raw packet record → fixed-width feature record.

mod extractor;

pub use extractor::{FeatureExtractor, NO_PORT};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered column names of a feature record. This order is the CSV header.
pub const FEATURE_COLUMNS: [&str; 13] = [
    "packet_length",
    "inter_arrival_time",
    "ttl",
    "is_tcp",
    "is_udp",
    "is_icmp",
    "src_port",
    "dst_port",
    "syn_flag",
    "ack_flag",
    "fin_flag",
    "rst_flag",
    "is_well_known_port",
];

/// Loosely typed value as handed over by a packet source.
///
/// Sources disagree on representation (a dissector reports ports as text,
/// a header parser as integers), so the extractor accepts all three and
/// resolves them itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<u8> for FieldValue {
    fn from(v: u8) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// One captured packet, enriched with its inter-arrival time.
/// Lives only long enough to be fed to [`FeatureExtractor::extract`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPacketRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_length: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<FieldValue>,
    /// Hex string, e.g. `0x0018`. Only set for TCP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_flags: Option<String>,
    /// Captured for completeness; no feature is derived from it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_size: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inter_arrival_time: Option<FieldValue>,
}

/// Fixed-width numeric feature vector for one packet. Field order matches
/// [`FEATURE_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub packet_length: i64,
    pub inter_arrival_time: f64,
    pub ttl: i64,
    pub is_tcp: u8,
    pub is_udp: u8,
    pub is_icmp: u8,
    pub src_port: i64,
    pub dst_port: i64,
    pub syn_flag: u8,
    pub ack_flag: u8,
    pub fin_flag: u8,
    pub rst_flag: u8,
    pub is_well_known_port: u8,
}

/// A single cell of a feature record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{}", v),
            // Debug keeps the fractional part on whole numbers ("0.0", not "0")
            FeatureValue::Float(v) => write!(f, "{:?}", v),
        }
    }
}

impl FeatureRecord {
    /// Look up a column by name.
    pub fn value(&self, column: &str) -> Option<FeatureValue> {
        let v = match column {
            "packet_length" => FeatureValue::Int(self.packet_length),
            "inter_arrival_time" => FeatureValue::Float(self.inter_arrival_time),
            "ttl" => FeatureValue::Int(self.ttl),
            "is_tcp" => FeatureValue::Int(self.is_tcp.into()),
            "is_udp" => FeatureValue::Int(self.is_udp.into()),
            "is_icmp" => FeatureValue::Int(self.is_icmp.into()),
            "src_port" => FeatureValue::Int(self.src_port),
            "dst_port" => FeatureValue::Int(self.dst_port),
            "syn_flag" => FeatureValue::Int(self.syn_flag.into()),
            "ack_flag" => FeatureValue::Int(self.ack_flag.into()),
            "fin_flag" => FeatureValue::Int(self.fin_flag.into()),
            "rst_flag" => FeatureValue::Int(self.rst_flag.into()),
            "is_well_known_port" => FeatureValue::Int(self.is_well_known_port.into()),
            _ => return None,
        };
        Some(v)
    }

    /// Values in [`FEATURE_COLUMNS`] order.
    pub fn values(&self) -> Vec<FeatureValue> {
        FEATURE_COLUMNS
            .iter()
            .filter_map(|c| self.value(c))
            .collect()
    }
}
