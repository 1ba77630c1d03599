//! 节点类型
//!
//! 所有节点都装有 IPv4/TCP 协议栈；节点只记录名称和挂载的设备。

use super::id::{DeviceId, NodeId};

/// 主机节点
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    name: String,
    pub(crate) devices: Vec<DeviceId>,
}

impl Node {
    /// 创建新节点
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            devices: Vec::new(),
        }
    }

    /// 获取节点标识符
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// 获取节点名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 节点上的设备（按安装顺序）
    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }
}
