//! 经典 pcap 文件写出
//!
//! 仿真中的包没有真实字节，这里用 etherparse 为每个包合成 IPv4 + TCP 头部，
//! 载荷填零，链路类型为 RAW（直接以 IPv4 头开始）。

use std::io::{self, Write};

use etherparse::PacketBuilder;

use crate::net::{HEADER_BYTES, Packet, TcpSegment};
use crate::sim::SimTime;

pub const PCAP_MAGIC: u32 = 0xa1b2_c3d4;
pub const LINKTYPE_RAW: u32 = 101;
pub const DEFAULT_SNAPLEN: u32 = 65_535;

/// pcap 写出器
pub struct PcapWriter<W: Write> {
    out: W,
    snaplen: u32,
    records: u64,
}

impl<W: Write> PcapWriter<W> {
    /// 创建写出器并立即写入全局头
    pub fn new(mut out: W, snaplen: u32) -> io::Result<Self> {
        let mut hdr = Vec::with_capacity(24);
        hdr.extend_from_slice(&PCAP_MAGIC.to_le_bytes());
        hdr.extend_from_slice(&2u16.to_le_bytes());
        hdr.extend_from_slice(&4u16.to_le_bytes());
        hdr.extend_from_slice(&0i32.to_le_bytes()); // thiszone
        hdr.extend_from_slice(&0u32.to_le_bytes()); // sigfigs
        hdr.extend_from_slice(&snaplen.to_le_bytes());
        hdr.extend_from_slice(&LINKTYPE_RAW.to_le_bytes());
        out.write_all(&hdr)?;
        Ok(Self {
            out,
            snaplen,
            records: 0,
        })
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// 写一条记录；超过 snaplen 的部分被截断，`orig_len` 保留原长度。
    pub fn write_record(&mut self, at: SimTime, data: &[u8]) -> io::Result<()> {
        let orig_len = data.len() as u32;
        let incl = data.len().min(self.snaplen as usize);
        let ts_sec = (at.0 / 1_000_000_000) as u32;
        let ts_usec = ((at.0 % 1_000_000_000) / 1_000) as u32;

        let mut rec = Vec::with_capacity(16);
        rec.extend_from_slice(&ts_sec.to_le_bytes());
        rec.extend_from_slice(&ts_usec.to_le_bytes());
        rec.extend_from_slice(&(incl as u32).to_le_bytes());
        rec.extend_from_slice(&orig_len.to_le_bytes());
        self.out.write_all(&rec)?;
        self.out.write_all(&data[..incl])?;
        self.records += 1;
        Ok(())
    }

    /// 写出一个仿真包
    pub fn write_packet(&mut self, at: SimTime, pkt: &Packet) -> io::Result<()> {
        let bytes = encode_ipv4_tcp(pkt)?;
        self.write_record(at, &bytes)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// TCP 窗口字段固定值（仿真中不做窗口通告）
const TCP_WINDOW: u16 = u16::MAX;
const IP_TTL: u8 = 64;

/// 用 etherparse 合成 IPv4 + TCP 头部（含两层校验和），载荷填零。
///
/// 总长度等于包的线上长度，最少为两个头部的 40 字节。
pub fn encode_ipv4_tcp(pkt: &Packet) -> io::Result<Vec<u8>> {
    let src = pkt.src.ip().octets();
    let dst = pkt.dst.ip().octets();
    // 相对序号 +1（SYN 占一个序号）
    let seq = match pkt.tcp {
        TcpSegment::Syn | TcpSegment::SynAck => 0,
        TcpSegment::HandshakeAck | TcpSegment::Ack { .. } => 1,
        TcpSegment::Data { seq, .. } => seq.wrapping_add(1) as u32,
    };
    let tcp = PacketBuilder::ipv4(src, dst, IP_TTL).tcp(pkt.src.port(), pkt.dst.port(), seq, TCP_WINDOW);
    let builder = match pkt.tcp {
        TcpSegment::Syn => tcp.syn(),
        TcpSegment::SynAck => tcp.syn().ack(1),
        TcpSegment::HandshakeAck => tcp.ack(1),
        TcpSegment::Data { .. } => tcp.psh().ack(1),
        TcpSegment::Ack { ack } => tcp.ack(ack.wrapping_add(1) as u32),
    };

    let total = (pkt.size_bytes.max(HEADER_BYTES)).min(u16::MAX as u32) as usize;
    let payload = vec![0u8; total - HEADER_BYTES as usize];
    let mut buf = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut buf, &payload).map_err(io::Error::other)?;
    Ok(buf)
}
