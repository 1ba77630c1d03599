//! 文本事件 trace
//!
//! 每个事件一行：`<op> <秒> /NodeList/<n>/DeviceList/<d>/<设备类型>/<事件路径> <包摘要>`。

use std::io::{self, Write};

use crate::net::{ChannelKind, NodeId, Packet};
use crate::sim::SimTime;

/// trace 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    Enqueue,
    Dequeue,
    /// 发送队列满丢弃
    Drop,
    /// 接收端误码丢弃
    RxDrop,
    Receive,
}

impl TraceOp {
    pub fn symbol(self) -> char {
        match self {
            TraceOp::Enqueue => '+',
            TraceOp::Dequeue => '-',
            TraceOp::Drop | TraceOp::RxDrop => 'd',
            TraceOp::Receive => 'r',
        }
    }

    fn path(self) -> &'static str {
        match self {
            TraceOp::Enqueue => "TxQueue/Enqueue",
            TraceOp::Dequeue => "TxQueue/Dequeue",
            TraceOp::Drop => "TxQueue/Drop",
            TraceOp::RxDrop => "PhyRxDrop",
            TraceOp::Receive => "MacRx",
        }
    }
}

/// 事件发生的位置
#[derive(Debug, Clone, Copy)]
pub struct TracePoint {
    pub node: NodeId,
    pub dev_index: usize,
    pub kind: ChannelKind,
}

/// 文本 trace 写出器
pub struct AsciiTrace<W: Write> {
    out: W,
    lines: u64,
}

impl<W: Write> AsciiTrace<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn write_event(
        &mut self,
        op: TraceOp,
        at: SimTime,
        point: &TracePoint,
        pkt: &Packet,
    ) -> io::Result<()> {
        writeln!(
            self.out,
            "{} {} /NodeList/{}/DeviceList/{}/{}/{} id={} size={} {} > {} {}",
            op.symbol(),
            at,
            point.node.0,
            point.dev_index,
            point.kind.device_type(),
            op.path(),
            pkt.id,
            pkt.size_bytes,
            pkt.src,
            pkt.dst,
            pkt.tcp
        )?;
        self.lines += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
