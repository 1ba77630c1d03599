//! 世界 trait
//!
//! 定义仿真世界接口：事件通过它访问网络、协议栈与应用。

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：由业务层实现（例如网络拓扑/应用/统计等）。
pub trait World: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// 每个事件执行完成后回调。
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
