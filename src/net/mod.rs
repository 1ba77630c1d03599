//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件：节点、设备、信道、数据包、地址、路由与 socket API。

// 子模块声明
mod addr;
mod api;
mod channel;
mod data_rate;
mod device;
mod frame_events;
mod id;
mod net_world;
mod network;
mod node;
mod packet;
mod proto_bridge;
mod routing;
mod stats;
mod transport;

// 重新导出公共接口
pub use addr::Ipv4Allocator;
pub use api::{SocketApi, SocketError};
pub use channel::{Channel, ChannelKind};
pub use data_rate::{DataRate, DataRateError};
pub use device::{Device, RateErrorModel};
pub use frame_events::{FrameArrival, TxComplete};
pub use id::{ChannelId, DeviceId, NodeId, SocketId};
pub use net_world::NetWorld;
pub(crate) use net_world::net_world;
pub use network::{DEFAULT_SEED, Network};
pub use node::Node;
pub use packet::{HEADER_BYTES, Packet};
pub(crate) use proto_bridge::with_tcp_stack;
pub use routing::RoutingTable;
pub use stats::Stats;
pub use transport::TcpSegment;
