//! 队列策略（Queue disciplines）
//!
//! 设备发送队列。目前只有 DropTail（尾丢弃），容量按包数计。

mod drop_tail;

pub use drop_tail::DropTailQueue;

/// 默认队列容量（包数）
pub const DEFAULT_QUEUE_PKTS: usize = 10;
