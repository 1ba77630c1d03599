//! 网络世界实现
//!
//! 定义网络仿真的世界（World）实现，持有网络拓扑与应用表。

use super::network::Network;
use crate::app::AppTable;
use crate::sim::World;
use std::any::Any;

/// 默认的网络世界：持有 Network 与安装在节点上的应用。
#[derive(Default)]
pub struct NetWorld {
    pub net: Network,
    pub apps: AppTable,
}

impl World for NetWorld {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 事件执行时把 `dyn World` 还原为 `NetWorld`。
pub(crate) fn net_world(world: &mut dyn World) -> &mut NetWorld {
    world
        .as_any_mut()
        .downcast_mut::<NetWorld>()
        .expect("world must be NetWorld")
}
