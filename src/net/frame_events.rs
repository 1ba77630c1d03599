//! 链路层事件：帧到达与发送完成

use super::id::DeviceId;
use super::net_world::net_world;
use super::packet::Packet;
use crate::sim::{Event, Simulator, World};
use tracing::trace;

/// 事件：一个帧经过序列化与传播时延后到达接收设备。
#[derive(Debug)]
pub struct FrameArrival {
    pub from: DeviceId,
    pub to: DeviceId,
    pub pkt: Packet,
}

impl Event for FrameArrival {
    #[tracing::instrument(skip(self, sim, world), fields(pkt_id = self.pkt.id, to = ?self.to))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let FrameArrival { from, to, pkt } = *self;
        trace!(now = ?sim.now(), size_bytes = pkt.size_bytes, "📨 帧到达设备");
        net_world(world).net.on_frame_arrival(from, to, pkt, sim);
    }
}

/// 事件：设备完成一次序列化发送，在 depart 时刻触发，尝试发送队列中的下一个 packet。
#[derive(Debug)]
pub struct TxComplete {
    pub dev: DeviceId,
}

impl Event for TxComplete {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TxComplete { dev } = *self;
        net_world(world).net.on_tx_complete(dev, sim);
    }
}
