//! Packet sources: live capture, offline pcap replay, in-memory frames.
//! Shared frame type and the decoder that turns frames into raw records.

mod decode;
#[cfg(feature = "pcap")]
mod pcap_source;

pub use decode::decode_frame;
#[cfg(feature = "pcap")]
pub use pcap_source::PcapSource;

use crate::config::SnifferConfig;
use crate::error::CaptureError;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Whether this build can open live interfaces and capture files
/// (the `pcap` feature).
pub const CAPTURE_SUPPORTED: bool = cfg!(feature = "pcap");

/// Link-layer framing of captured bytes (libpcap DLT numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Ethernet,
    /// Bare IPv4/IPv6 packet, no link header.
    RawIp,
    /// Linux cooked capture (the `any` pseudo-device): 16-byte header,
    /// ether type in the last two bytes.
    LinuxSll,
    /// Linux cooked capture v2: 20-byte header, ether type first.
    LinuxSll2,
    /// BSD loopback: 4-byte address family word, then the IP packet.
    Null,
    Other(i32),
}

impl LinkType {
    pub fn from_dlt(dlt: i32) -> Self {
        match dlt {
            1 => LinkType::Ethernet,
            12 | 14 | 101 | 228 | 229 => LinkType::RawIp,
            0 | 108 => LinkType::Null,
            113 => LinkType::LinuxSll,
            276 => LinkType::LinuxSll2,
            other => LinkType::Other(other),
        }
    }
}

/// One frame as delivered by a source, before any decoding.
#[derive(Debug, Clone)]
pub struct CapturedPacket {
    pub timestamp: DateTime<Utc>,
    /// Length on the wire; may exceed `data.len()` when the snaplen truncated it.
    pub wire_len: u32,
    pub link: LinkType,
    pub data: Vec<u8>,
}

impl CapturedPacket {
    pub fn ethernet(timestamp: DateTime<Utc>, data: Vec<u8>) -> Self {
        Self {
            timestamp,
            wire_len: data.len() as u32,
            link: LinkType::Ethernet,
            data,
        }
    }
}

#[derive(Debug)]
pub enum SourceEvent {
    Packet(CapturedPacket),
    /// Nothing arrived before the read timeout; poll again.
    Idle,
    /// The source has no more packets (end of file, closed handle).
    Exhausted,
}

/// Producer of captured frames. `Err` means the source itself is broken and
/// the session must end.
pub trait PacketSource {
    fn next_event(&mut self) -> Result<SourceEvent, CaptureError>;
}

impl<T: PacketSource + ?Sized> PacketSource for Box<T> {
    fn next_event(&mut self) -> Result<SourceEvent, CaptureError> {
        (**self).next_event()
    }
}

/// Frames already held in memory, replayed in order.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<CapturedPacket>,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = CapturedPacket>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn push(&mut self, frame: CapturedPacket) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PacketSource for MemorySource {
    fn next_event(&mut self) -> Result<SourceEvent, CaptureError> {
        Ok(self
            .frames
            .pop_front()
            .map(SourceEvent::Packet)
            .unwrap_or(SourceEvent::Exhausted))
    }
}

/// Open the source named by the configuration: the replay file when one is
/// set, otherwise the live interface.
#[cfg(feature = "pcap")]
pub fn open_source(config: &SnifferConfig) -> Result<Box<dyn PacketSource + Send>, CaptureError> {
    let capture = &config.capture;
    Ok(match &capture.read_file {
        Some(path) => Box::new(PcapSource::offline(path)?),
        None => Box::new(PcapSource::live(
            &config.interface,
            capture.snaplen,
            capture.promiscuous,
            capture.timeout_ms,
        )?),
    })
}

#[cfg(not(feature = "pcap"))]
pub fn open_source(_config: &SnifferConfig) -> Result<Box<dyn PacketSource + Send>, CaptureError> {
    Err(CaptureError::Unavailable)
}
