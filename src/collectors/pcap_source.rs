//! libpcap-backed source: a live interface or an offline capture file.

use super::{CapturedPacket, LinkType, PacketSource, SourceEvent};
use crate::error::CaptureError;
use chrono::{TimeZone, Utc};
use pcap::{Activated, Active, Capture, Offline};
use std::path::Path;
use tracing::info;

pub struct PcapSource<T: Activated> {
    capture: Capture<T>,
    link: LinkType,
}

impl PcapSource<Active> {
    /// Open `interface` for live capture. The read timeout bounds how long
    /// [`PacketSource::next_event`] blocks before reporting [`SourceEvent::Idle`].
    pub fn live(interface: &str, snaplen: i32, promiscuous: bool, timeout_ms: i32) -> Result<Self, CaptureError> {
        let open_err = |e: pcap::Error| CaptureError::Open {
            target: interface.to_string(),
            reason: e.to_string(),
        };
        let capture = Capture::from_device(interface)
            .map_err(open_err)?
            .promisc(promiscuous)
            .snaplen(snaplen)
            .timeout(timeout_ms)
            .open()
            .map_err(open_err)?;
        let link = LinkType::from_dlt(capture.get_datalink().0);
        info!(interface, ?link, snaplen, promiscuous, "live capture opened");
        Ok(Self { capture, link })
    }
}

impl PcapSource<Offline> {
    /// Replay a pcap file.
    pub fn offline(path: &Path) -> Result<Self, CaptureError> {
        let capture = Capture::from_file(path).map_err(|e| CaptureError::Open {
            target: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let link = LinkType::from_dlt(capture.get_datalink().0);
        info!(path = %path.display(), ?link, "capture file opened");
        Ok(Self { capture, link })
    }
}

impl<T: Activated> PacketSource for PcapSource<T> {
    fn next_event(&mut self) -> Result<SourceEvent, CaptureError> {
        match self.capture.next_packet() {
            Ok(packet) => {
                let ts = packet.header.ts;
                let timestamp = Utc
                    .timestamp_opt(ts.tv_sec as i64, (ts.tv_usec as u32).saturating_mul(1000))
                    .single()
                    .unwrap_or_else(Utc::now);
                Ok(SourceEvent::Packet(CapturedPacket {
                    timestamp,
                    wire_len: packet.header.len,
                    link: self.link,
                    data: packet.data.to_vec(),
                }))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(SourceEvent::Idle),
            Err(pcap::Error::NoMorePackets) => Ok(SourceEvent::Exhausted),
            Err(e) => Err(CaptureError::Source(e.to_string())),
        }
    }
}
