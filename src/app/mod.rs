//! 应用层
//!
//! 节点上运行的应用：限速流量发生器与接收端 sink。应用只通过
//! [`SocketApi`] 访问传输层，并通过 [`Simulator`] 调度自己的回调。

mod generator;
mod sink;

pub use generator::{GeneratorError, TrafficGenerator};
pub use sink::PacketSink;

use tracing::{debug, info, warn};

use crate::net::{NetWorld, NodeId, SocketApi, net_world};
use crate::sim::{Event, SimTime, Simulator, World};

/// 应用标识符（在 [`AppTable`] 中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppId(pub usize);

/// 应用回调可用的上下文
pub struct AppContext<'a> {
    pub app: AppId,
    pub node: NodeId,
    pub sim: &'a mut Simulator,
    pub net: &'a mut dyn SocketApi,
}

/// 应用的启停能力
pub trait Application {
    type Error: std::error::Error;

    fn activate(&mut self, ctx: &mut AppContext<'_>) -> Result<(), Self::Error>;

    /// 可重复调用，任何状态下都不失败
    fn deactivate(&mut self, ctx: &mut AppContext<'_>);
}

/// 安装在节点上的应用
#[derive(Debug)]
pub enum AppKind {
    Generator(TrafficGenerator),
    Sink(PacketSink),
}

impl From<TrafficGenerator> for AppKind {
    fn from(g: TrafficGenerator) -> Self {
        AppKind::Generator(g)
    }
}

impl From<PacketSink> for AppKind {
    fn from(s: PacketSink) -> Self {
        AppKind::Sink(s)
    }
}

#[derive(Debug)]
struct AppSlot {
    node: NodeId,
    start: SimTime,
    stop: SimTime,
    kind: AppKind,
}

/// 所有已安装应用
#[derive(Debug, Default)]
pub struct AppTable {
    slots: Vec<AppSlot>,
}

impl AppTable {
    /// 安装应用，并调度其在 `start` 启动、`stop` 停止。
    pub fn install(
        &mut self,
        node: NodeId,
        app: impl Into<AppKind>,
        start: SimTime,
        stop: SimTime,
        sim: &mut Simulator,
    ) -> AppId {
        let id = AppId(self.slots.len());
        self.slots.push(AppSlot {
            node,
            start,
            stop,
            kind: app.into(),
        });
        sim.schedule(start, AppStart { app: id });
        sim.schedule(stop, AppStop { app: id });
        debug!(app = ?id, node = ?node, ?start, ?stop, "应用已安装");
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn node(&self, id: AppId) -> Option<NodeId> {
        self.slots.get(id.0).map(|s| s.node)
    }

    /// 启停时刻
    pub fn window(&self, id: AppId) -> Option<(SimTime, SimTime)> {
        self.slots.get(id.0).map(|s| (s.start, s.stop))
    }

    pub fn get(&self, id: AppId) -> Option<&AppKind> {
        self.slots.get(id.0).map(|s| &s.kind)
    }

    pub fn generator(&self, id: AppId) -> Option<&TrafficGenerator> {
        match self.get(id)? {
            AppKind::Generator(g) => Some(g),
            AppKind::Sink(_) => None,
        }
    }

    pub fn sink(&self, id: AppId) -> Option<&PacketSink> {
        match self.get(id)? {
            AppKind::Sink(s) => Some(s),
            AppKind::Generator(_) => None,
        }
    }

    pub fn generators(&self) -> impl Iterator<Item = (AppId, &TrafficGenerator)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| match &s.kind {
            AppKind::Generator(g) => Some((AppId(i), g)),
            AppKind::Sink(_) => None,
        })
    }

    pub fn activate(&mut self, id: AppId, sim: &mut Simulator, net: &mut dyn SocketApi) {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return;
        };
        let mut ctx = AppContext {
            app: id,
            node: slot.node,
            sim,
            net,
        };
        let result = match &mut slot.kind {
            AppKind::Generator(g) => g.activate(&mut ctx).map_err(|e| e.to_string()),
            AppKind::Sink(s) => s.activate(&mut ctx).map_err(|e| e.to_string()),
        };
        match result {
            Ok(()) => info!(app = ?id, node = ?slot.node, now = ?ctx.sim.now(), "▶️  应用启动"),
            Err(e) => warn!(app = ?id, node = ?slot.node, error = %e, "应用启动失败"),
        }
    }

    pub fn deactivate(&mut self, id: AppId, sim: &mut Simulator, net: &mut dyn SocketApi) {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return;
        };
        let mut ctx = AppContext {
            app: id,
            node: slot.node,
            sim,
            net,
        };
        match &mut slot.kind {
            AppKind::Generator(g) => g.deactivate(&mut ctx),
            AppKind::Sink(s) => s.deactivate(&mut ctx),
        }
        info!(app = ?id, node = ?slot.node, now = ?ctx.sim.now(), "⏹️  应用停止");
    }

    fn on_generator_send(&mut self, id: AppId, sim: &mut Simulator, net: &mut dyn SocketApi) {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return;
        };
        if let AppKind::Generator(g) = &mut slot.kind {
            let mut ctx = AppContext {
                app: id,
                node: slot.node,
                sim,
                net,
            };
            g.send_unit(&mut ctx);
        }
    }
}

/// 事件：启动应用
#[derive(Debug)]
pub struct AppStart {
    pub app: AppId,
}

impl Event for AppStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let NetWorld { net, apps } = net_world(world);
        apps.activate(self.app, sim, net);
    }
}

/// 事件：停止应用
#[derive(Debug)]
pub struct AppStop {
    pub app: AppId,
}

impl Event for AppStop {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let NetWorld { net, apps } = net_world(world);
        apps.deactivate(self.app, sim, net);
    }
}

/// 事件：发生器的下一次发送
#[derive(Debug)]
pub struct GeneratorSend {
    pub app: AppId,
}

impl Event for GeneratorSend {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let NetWorld { net, apps } = net_world(world);
        apps.on_generator_send(self.app, sim, net);
    }
}
