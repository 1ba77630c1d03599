//! 混合拓扑构建：点对点 + CSMA 局域网 + Wi-Fi
//!
//! ```text
//!   Wifi 10.1.3.0
//!                             AP
//!  *    *    *    *    *
//!  |    |    |    |    |      10.1.1.0
//! n4   n5   n6   n7   n8   n0 ---------- n1
//!                           |  p2p
//!                      ============
//!                       n0  n2  n3
//!                      LAN 10.1.2.0
//! ```
//!
//! n0 同时是 p2p 一端、CSMA 总线成员与 Wi-Fi AP；n1 是 p2p 另一端（sink 所在）。
//! 节点编号：n0、n1，然后是 CSMA 额外节点，最后是 Wi-Fi 站点。

use std::net::{Ipv4Addr, SocketAddrV4};

use thiserror::Error;
use tracing::info;

use crate::net::{ChannelKind, DataRate, DeviceId, Ipv4Allocator, NetWorld, NodeId, RateErrorModel};
use crate::queue::DEFAULT_QUEUE_PKTS;
use crate::sim::SimTime;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("subnet {0} has no free address")]
    AddressExhausted(Ipv4Addr),
}

/// 混合拓扑配置选项
#[derive(Debug, Clone)]
pub struct MixedOpts {
    /// CSMA 总线上除 n0 之外的节点数
    pub n_csma: u32,
    pub n_wifi: u32,
    pub p2p_rate: DataRate,
    pub p2p_delay: SimTime,
    /// 每个设备的 drop-tail 队列长度（包）
    pub queue_pkts: usize,
    /// n1 p2p 设备上的接收字节误码率
    pub error_rate: f64,
    pub csma_rate: DataRate,
    pub csma_delay: SimTime,
    pub wifi_rate: DataRate,
    pub wifi_delay: SimTime,
    pub sink_port: u16,
    pub p2p_subnet: Ipv4Addr,
    pub csma_subnet: Ipv4Addr,
    pub wifi_subnet: Ipv4Addr,
    pub sim_time: SimTime,
}

impl Default for MixedOpts {
    fn default() -> Self {
        Self {
            n_csma: 2,
            n_wifi: 5,
            p2p_rate: DataRate::from_mbps(5),
            p2p_delay: SimTime::from_millis(5),
            queue_pkts: DEFAULT_QUEUE_PKTS,
            error_rate: 0.000001,
            csma_rate: DataRate::from_mbps(100),
            csma_delay: SimTime::from_nanos(6560),
            wifi_rate: DataRate::from_mbps(54),
            wifi_delay: SimTime::ZERO,
            sink_port: 8080,
            p2p_subnet: Ipv4Addr::new(10, 1, 1, 0),
            csma_subnet: Ipv4Addr::new(10, 1, 2, 0),
            wifi_subnet: Ipv4Addr::new(10, 1, 3, 0),
            sim_time: SimTime::from_secs(10),
        }
    }
}

/// 构建结果：各组节点与设备，按安装顺序
#[derive(Debug, Clone)]
pub struct MixedTopology {
    /// [n0, n1]
    pub p2p_nodes: [NodeId; 2],
    /// n0 在前，然后是额外的 CSMA 节点
    pub csma_nodes: Vec<NodeId>,
    pub wifi_sta_nodes: Vec<NodeId>,
    pub ap: NodeId,
    pub p2p_devices: [DeviceId; 2],
    pub csma_devices: Vec<DeviceId>,
    pub sta_devices: Vec<DeviceId>,
    pub ap_device: DeviceId,
    pub sink_addr: SocketAddrV4,
}

impl MixedTopology {
    /// sink 所在节点（n1）
    pub fn sink_node(&self) -> NodeId {
        self.p2p_nodes[1]
    }

    /// 全部 Wi-Fi 设备：站点在前，AP 在后
    pub fn wifi_devices(&self) -> Vec<DeviceId> {
        let mut devs = self.sta_devices.clone();
        devs.push(self.ap_device);
        devs
    }
}

fn assign_all(
    world: &mut NetWorld,
    subnet: Ipv4Addr,
    devices: &[DeviceId],
) -> Result<(), TopologyError> {
    let mut alloc = Ipv4Allocator::new(subnet, 24);
    for &dev in devices {
        let addr = alloc.next_addr().ok_or(TopologyError::AddressExhausted(subnet))?;
        world.net.assign_address(dev, addr);
    }
    Ok(())
}

/// 构建混合拓扑并生成全局路由
pub fn build_mixed(world: &mut NetWorld, opts: &MixedOpts) -> Result<MixedTopology, TopologyError> {
    let net = &mut world.net;

    // p2p: n0 <-> n1
    let n0 = net.add_node("n0");
    let n1 = net.add_node("n1");
    let p2p = net.add_channel(ChannelKind::PointToPoint, opts.p2p_rate, opts.p2p_delay);
    let p2p_devices = [net.attach(n0, p2p), net.attach(n1, p2p)];
    net.set_receive_error_model(p2p_devices[1], Some(RateErrorModel::new(opts.error_rate)));

    // CSMA: n0 + n_csma 个额外节点
    let mut csma_nodes = vec![n0];
    for _ in 0..opts.n_csma {
        let id = net.nodes().len();
        csma_nodes.push(net.add_node(format!("n{id}")));
    }
    let csma = net.add_channel(ChannelKind::Csma, opts.csma_rate, opts.csma_delay);
    let csma_devices: Vec<DeviceId> = csma_nodes.iter().map(|&n| net.attach(n, csma)).collect();

    // Wi-Fi: 站点先安装，AP（n0）最后
    let wifi_sta_nodes: Vec<NodeId> = (0..opts.n_wifi)
        .map(|_| {
            let id = net.nodes().len();
            net.add_node(format!("n{id}"))
        })
        .collect();
    let wifi = net.add_channel(ChannelKind::Wifi, opts.wifi_rate, opts.wifi_delay);
    let sta_devices: Vec<DeviceId> = wifi_sta_nodes.iter().map(|&n| net.attach(n, wifi)).collect();
    let ap_device = net.attach(n0, wifi);
    net.set_access_point(wifi, ap_device);

    let all_devices: Vec<DeviceId> = net.devices().iter().map(|d| d.id).collect();
    for dev in all_devices {
        net.set_queue_capacity_pkts(dev, opts.queue_pkts);
    }

    let mut wifi_devices = sta_devices.clone();
    wifi_devices.push(ap_device);
    assign_all(world, opts.p2p_subnet, &p2p_devices)?;
    assign_all(world, opts.csma_subnet, &csma_devices)?;
    assign_all(world, opts.wifi_subnet, &wifi_devices)?;

    world.net.populate_routes();

    let sink_ip = world
        .net
        .device_addr(p2p_devices[1])
        .ok_or(TopologyError::AddressExhausted(opts.p2p_subnet))?;
    let topo = MixedTopology {
        p2p_nodes: [n0, n1],
        csma_nodes,
        wifi_sta_nodes,
        ap: n0,
        p2p_devices,
        csma_devices,
        sta_devices,
        ap_device,
        sink_addr: SocketAddrV4::new(sink_ip, opts.sink_port),
    };
    info!(
        nodes = world.net.nodes().len(),
        devices = world.net.devices().len(),
        n_csma = opts.n_csma,
        n_wifi = opts.n_wifi,
        sink = %topo.sink_addr,
        "🏗️  混合拓扑已构建"
    );
    Ok(topo)
}
