//! 统计信息
//!
//! 定义网络仿真统计数据结构。

use serde::Serialize;

/// 网络统计信息
#[derive(Debug, Default, Clone, Serialize)]
pub struct Stats {
    /// 送达目的主机的包数/字节数
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    /// 设备队列满导致的尾丢弃
    pub dropped_pkts: u64,
    pub dropped_bytes: u64,
    /// 接收端误码模型丢弃
    pub corrupted_pkts: u64,
    /// 目的地址未知或不可达
    pub no_route_pkts: u64,
}
