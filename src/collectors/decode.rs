//! Captured frame → raw packet record.
//!
//! Only the fields the feature extractor (and the record's optional extras)
//! need are read. Layers a frame does not carry leave their fields unset.

use super::{CapturedPacket, LinkType};
use crate::error::PacketError;
use crate::features::{FieldValue, RawPacketRecord};
use etherparse::{InternetSlice, SlicedPacket, TcpHeaderSlice, TransportSlice};

const SLL_HEADER_LEN: usize = 16;
const SLL2_HEADER_LEN: usize = 20;
const NULL_HEADER_LEN: usize = 4;

/// The first `len` bytes of `data`, or a decode error for a truncated frame.
fn link_header(data: &[u8], len: usize) -> Result<&[u8], PacketError> {
    data.get(..len)
        .ok_or_else(|| PacketError::Decode(format!("link header needs {} bytes, frame has {}", len, data.len())))
}

fn ether_type_at(header: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([header[offset], header[offset + 1]])
}

pub fn decode_frame(packet: &CapturedPacket) -> Result<RawPacketRecord, PacketError> {
    let data = packet.data.as_slice();
    let sliced = match packet.link {
        LinkType::Ethernet => SlicedPacket::from_ethernet(data),
        LinkType::RawIp => SlicedPacket::from_ip(data),
        LinkType::LinuxSll => {
            let header = link_header(data, SLL_HEADER_LEN)?;
            SlicedPacket::from_ether_type(ether_type_at(header, 14), &data[SLL_HEADER_LEN..])
        }
        LinkType::LinuxSll2 => {
            let header = link_header(data, SLL2_HEADER_LEN)?;
            SlicedPacket::from_ether_type(ether_type_at(header, 0), &data[SLL2_HEADER_LEN..])
        }
        LinkType::Null => {
            link_header(data, NULL_HEADER_LEN)?;
            SlicedPacket::from_ip(&data[NULL_HEADER_LEN..])
        }
        LinkType::Other(dlt) => return Err(PacketError::UnsupportedLink(dlt)),
    }
    .map_err(|e| PacketError::Decode(format!("{:?}", e)))?;

    let mut record = RawPacketRecord {
        timestamp: Some(packet.timestamp),
        packet_length: Some(FieldValue::from(packet.wire_len)),
        ..Default::default()
    };

    let network = match &sliced.ip {
        Some(InternetSlice::Ipv4(header, _)) => {
            record.src_ip = Some(header.source_addr().to_string());
            record.dst_ip = Some(header.destination_addr().to_string());
            record.ttl = Some(FieldValue::from(header.ttl()));
            Some("IP")
        }
        Some(InternetSlice::Ipv6(header, _)) => {
            record.src_ip = Some(header.source_addr().to_string());
            record.dst_ip = Some(header.destination_addr().to_string());
            record.ttl = Some(FieldValue::from(header.hop_limit()));
            Some("IPV6")
        }
        None => None,
    };

    let transport = match &sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => {
            record.src_port = Some(FieldValue::from(tcp.source_port()));
            record.dst_port = Some(FieldValue::from(tcp.destination_port()));
            record.tcp_flags = Some(format!("0x{:04x}", tcp_flag_bits(tcp)));
            record.window_size = Some(FieldValue::from(tcp.window_size()));
            Some("TCP")
        }
        Some(TransportSlice::Udp(udp)) => {
            record.src_port = Some(FieldValue::from(udp.source_port()));
            record.dst_port = Some(FieldValue::from(udp.destination_port()));
            Some("UDP")
        }
        Some(TransportSlice::Icmpv4(_)) => Some("ICMP"),
        Some(TransportSlice::Icmpv6(_)) => Some("ICMPv6"),
        Some(TransportSlice::Unknown(_)) | None => None,
    };
    record.transport_layer = transport.map(String::from);

    let carries_payload = matches!(transport, Some("TCP") | Some("UDP")) && !sliced.payload.is_empty();
    let highest = if carries_payload {
        "DATA"
    } else {
        transport.or(network).unwrap_or("ETH")
    };
    record.highest_layer = Some(highest.to_string());

    Ok(record)
}

/// Flags in wire order: NS(0x100) CWR ECE URG ACK PSH RST SYN FIN(0x01).
fn tcp_flag_bits(tcp: &TcpHeaderSlice<'_>) -> u16 {
    [
        (tcp.fin(), 0x001),
        (tcp.syn(), 0x002),
        (tcp.rst(), 0x004),
        (tcp.psh(), 0x008),
        (tcp.ack(), 0x010),
        (tcp.urg(), 0x020),
        (tcp.ece(), 0x040),
        (tcp.cwr(), 0x080),
        (tcp.ns(), 0x100),
    ]
    .iter()
    .filter(|(set, _)| *set)
    .fold(0, |acc, (_, bit)| acc | bit)
}
