//! Raw packet record → feature record. Total over arbitrary input: every
//! conversion falls back to a default instead of failing.

use super::{FeatureRecord, FieldValue, RawPacketRecord};

const TCP_FIN: u64 = 0x01;
const TCP_SYN: u64 = 0x02;
const TCP_RST: u64 = 0x04;
const TCP_ACK: u64 = 0x10;

/// Sentinel for "no port", outside the valid 0–65535 range.
pub const NO_PORT: i64 = -1;

const WELL_KNOWN_PORTS: std::ops::RangeInclusive<i64> = 0..=1023;

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, packet: &RawPacketRecord) -> FeatureRecord {
        let transport = packet.transport_layer.as_deref();
        let flags = packet.tcp_flags.as_deref().map(parse_hex_flags).unwrap_or(0);

        FeatureRecord {
            packet_length: to_int(packet.packet_length.as_ref(), 0),
            inter_arrival_time: to_float(packet.inter_arrival_time.as_ref(), 0.0),
            ttl: to_int(packet.ttl.as_ref(), 0),
            is_tcp: bit(transport == Some("TCP")),
            is_udp: bit(transport == Some("UDP")),
            is_icmp: bit(transport.is_some_and(|t| t.contains("ICMP"))),
            src_port: to_int(packet.src_port.as_ref(), NO_PORT),
            dst_port: to_int(packet.dst_port.as_ref(), NO_PORT),
            syn_flag: bit(flags & TCP_SYN != 0),
            ack_flag: bit(flags & TCP_ACK != 0),
            fin_flag: bit(flags & TCP_FIN != 0),
            rst_flag: bit(flags & TCP_RST != 0),
            // Only an integer-typed port qualifies; text such as "80" does not.
            is_well_known_port: match packet.dst_port {
                Some(FieldValue::Int(port)) => bit(WELL_KNOWN_PORTS.contains(&port)),
                _ => 0,
            },
        }
    }
}

fn bit(set: bool) -> u8 {
    u8::from(set)
}

fn to_int(value: Option<&FieldValue>, default: i64) -> i64 {
    match value {
        Some(FieldValue::Int(v)) => *v,
        Some(FieldValue::Float(v)) if v.is_finite() && v.abs() < i64::MAX as f64 => v.trunc() as i64,
        Some(FieldValue::Text(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn to_float(value: Option<&FieldValue>, default: f64) -> f64 {
    match value {
        Some(FieldValue::Float(v)) => *v,
        Some(FieldValue::Int(v)) => *v as f64,
        Some(FieldValue::Text(s)) => s.trim().parse().unwrap_or(default),
        None => default,
    }
}

/// Hex integer with an optional sign, optional `0x`/`0X` prefix and single
/// `_` separators between digits (a `_` may also follow the prefix). Values
/// wider than 64 bits keep their low bits; a negative value is taken in
/// two's complement. Anything unparsable is 0.
fn parse_hex_flags(raw: &str) -> u64 {
    let s = raw.trim();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (prefixed, digits) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let digits = match digits.strip_prefix('_') {
        Some(rest) if prefixed => rest,
        _ => digits,
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return 0;
    }

    let mut value: u64 = 0;
    for c in digits.chars().filter(|&c| c != '_') {
        match c.to_digit(16) {
            Some(d) => value = value.wrapping_mul(16).wrapping_add(u64::from(d)),
            None => return 0,
        }
    }
    if negative {
        value.wrapping_neg()
    } else {
        value
    }
}
