//! 网络设备（网卡）
//!
//! 每个设备挂在一个节点和一个信道上，持有发送队列与可选的接收误码模型。

use std::net::Ipv4Addr;

use rand::Rng;

use super::id::{ChannelId, DeviceId, NodeId};
use crate::queue::{DEFAULT_QUEUE_PKTS, DropTailQueue};
use crate::sim::SimTime;

/// 按字节误码率丢弃帧：整帧出错概率 `1 - (1 - rate)^bytes`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateErrorModel {
    pub byte_error_rate: f64,
}

impl RateErrorModel {
    pub fn new(byte_error_rate: f64) -> Self {
        Self { byte_error_rate }
    }

    pub fn frame_error_prob(&self, bytes: u32) -> f64 {
        let p = self.byte_error_rate.clamp(0.0, 1.0);
        1.0 - (1.0 - p).powi(bytes as i32)
    }

    pub fn corrupts<R: Rng + ?Sized>(&self, bytes: u32, rng: &mut R) -> bool {
        let p = self.frame_error_prob(bytes);
        p > 0.0 && rng.gen_bool(p.min(1.0))
    }
}

/// 网络设备
#[derive(Debug)]
pub struct Device {
    pub id: DeviceId,
    pub node: NodeId,
    /// 在所属节点上的设备序号（trace/pcap 文件命名用）
    pub index_on_node: usize,
    pub channel: ChannelId,
    pub addr: Option<Ipv4Addr>,
    pub queue: DropTailQueue,
    pub rx_error: Option<RateErrorModel>,
    /// 正在发送一个帧（等待 TxComplete）
    pub(crate) transmitting: bool,
    /// 全双工链路本方向的占用截止时刻
    pub(crate) busy_until: SimTime,
}

impl Device {
    pub fn new(id: DeviceId, node: NodeId, index_on_node: usize, channel: ChannelId) -> Self {
        Self {
            id,
            node,
            index_on_node,
            channel,
            addr: None,
            queue: DropTailQueue::new(DEFAULT_QUEUE_PKTS),
            rx_error: None,
            transmitting: false,
            busy_until: SimTime::ZERO,
        }
    }
}
