//! 信道类型
//!
//! 点对点（全双工）、CSMA 总线与 Wi-Fi 共享信道（半双工）。

use super::data_rate::DataRate;
use super::id::DeviceId;
use crate::sim::SimTime;

/// 信道种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    PointToPoint,
    Csma,
    Wifi,
}

impl ChannelKind {
    /// 共享介质：同一时刻信道上只有一个帧在发送
    pub fn is_shared(self) -> bool {
        !matches!(self, ChannelKind::PointToPoint)
    }

    /// trace 路径中的设备类型名
    pub fn device_type(self) -> &'static str {
        match self {
            ChannelKind::PointToPoint => "PointToPointNetDevice",
            ChannelKind::Csma => "CsmaNetDevice",
            ChannelKind::Wifi => "WifiNetDevice",
        }
    }
}

/// 信道
#[derive(Debug)]
pub struct Channel {
    pub kind: ChannelKind,
    pub rate: DataRate,
    pub delay: SimTime,
    pub devices: Vec<DeviceId>,
    /// Wi-Fi 基础设施模式下的 AP 设备：站点之间不直接相邻
    pub ap: Option<DeviceId>,
    /// 共享介质的占用截止时刻
    pub(crate) busy_until: SimTime,
}

impl Channel {
    pub fn new(kind: ChannelKind, rate: DataRate, delay: SimTime) -> Self {
        Self {
            kind,
            rate,
            delay,
            devices: Vec::new(),
            ap: None,
            busy_until: SimTime::ZERO,
        }
    }

    /// `dev` 在本信道上可以直接到达的设备
    pub fn neighbors(&self, dev: DeviceId) -> Vec<DeviceId> {
        match (self.kind, self.ap) {
            (ChannelKind::Wifi, Some(ap)) if dev != ap => vec![ap],
            (ChannelKind::Wifi, Some(_)) => self
                .devices
                .iter()
                .copied()
                .filter(|d| *d != dev)
                .collect(),
            // 没有 AP 的 Wi-Fi 信道不可通信
            (ChannelKind::Wifi, None) => Vec::new(),
            _ => self
                .devices
                .iter()
                .copied()
                .filter(|d| *d != dev)
                .collect(),
        }
    }
}
