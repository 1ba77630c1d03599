//! Transport-layer tags carried by packets.

use std::fmt;

/// TCP segment (minimal fields for simulation).
///
/// Sequence numbers are relative byte offsets in the stream; the handshake
/// does not consume sequence space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpSegment {
    /// SYN
    Syn,
    /// SYN-ACK
    SynAck,
    /// ACK completing the handshake
    HandshakeAck,
    /// Data segment: `seq` is byte sequence number, `len` is payload bytes.
    Data { seq: u64, len: u32 },
    /// ACK segment: `ack` is next expected byte (cumulative).
    Ack { ack: u64 },
}

impl TcpSegment {
    /// Payload bytes carried by the segment.
    pub fn payload_len(&self) -> u32 {
        match self {
            TcpSegment::Data { len, .. } => *len,
            _ => 0,
        }
    }

    pub fn is_control(&self) -> bool {
        !matches!(self, TcpSegment::Data { .. })
    }
}

impl fmt::Display for TcpSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcpSegment::Syn => write!(f, "[SYN]"),
            TcpSegment::SynAck => write!(f, "[SYN,ACK]"),
            TcpSegment::HandshakeAck => write!(f, "[ACK]"),
            TcpSegment::Data { seq, len } => write!(f, "[DATA] seq={seq} len={len}"),
            TcpSegment::Ack { ack } => write!(f, "[ACK] ack={ack}"),
        }
    }
}
