//! 数据包类型
//!
//! 定义网络层数据包：IPv4 源/目的端点 + TCP 段标签。

use std::net::SocketAddrV4;

use super::id::DeviceId;
use super::transport::TcpSegment;

/// IPv4 + TCP 头部开销（字节），不含选项。
pub const HEADER_BYTES: u32 = 40;

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub src: SocketAddrV4,
    pub dst: SocketAddrV4,
    /// 线上总长度（头部 + 载荷）
    pub size_bytes: u32,
    pub tcp: TcpSegment,
    /// 当前这一跳的链路层目的设备（入队时由转发逻辑填写）
    pub(crate) l2_dst: Option<DeviceId>,
}

impl Packet {
    /// 载荷长度
    pub fn payload_len(&self) -> u32 {
        self.tcp.payload_len()
    }
}
