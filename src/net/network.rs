//! 网络拓扑管理
//!
//! 定义网络拓扑结构：节点、设备、信道、地址、路由，以及逐跳转发、
//! 设备队列、信道占用与接收误码。协议栈与 trace 也挂在这里。

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace};

use super::channel::{Channel, ChannelKind};
use super::data_rate::DataRate;
use super::device::{Device, RateErrorModel};
use super::frame_events::{FrameArrival, TxComplete};
use super::id::{ChannelId, DeviceId, NodeId};
use super::node::Node;
use super::packet::{HEADER_BYTES, Packet};
use super::routing::RoutingTable;
use super::stats::Stats;
use super::transport::TcpSegment;
use crate::proto::tcp::TcpStack;
use crate::sim::{SimTime, Simulator};
use crate::trace::{AsciiStreamId, TraceError, TraceHub, TraceOp, TracePoint};

/// 默认误码模型随机种子
pub const DEFAULT_SEED: u64 = 1;

/// 网络拓扑
pub struct Network {
    nodes: Vec<Node>,
    devices: Vec<Device>,
    channels: Vec<Channel>,
    addrs: HashMap<Ipv4Addr, DeviceId>,
    /// (from, to) -> (from 上的出设备, to 上的入设备)
    edges: HashMap<(NodeId, NodeId), (DeviceId, DeviceId)>,
    routing: RoutingTable,
    next_pkt_id: u64,
    rng: StdRng,
    pub tcp: TcpStack,
    pub traces: TraceHub,
    pub stats: Stats,
}

impl Default for Network {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

impl Network {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            devices: Vec::new(),
            channels: Vec::new(),
            addrs: HashMap::new(),
            edges: HashMap::new(),
            routing: RoutingTable::new(),
            next_pkt_id: 0,
            rng: StdRng::seed_from_u64(seed),
            tcp: TcpStack::default(),
            traces: TraceHub::default(),
            stats: Stats::default(),
        }
    }

    /// 重新设置误码模型随机种子
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// 添加节点
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, name));
        self.routing.mark_dirty();
        id
    }

    /// 添加信道
    pub fn add_channel(&mut self, kind: ChannelKind, rate: DataRate, delay: SimTime) -> ChannelId {
        let id = ChannelId(self.channels.len());
        self.channels.push(Channel::new(kind, rate, delay));
        id
    }

    /// 在节点上安装一个挂到 `channel` 的设备
    pub fn attach(&mut self, node: NodeId, channel: ChannelId) -> DeviceId {
        let id = DeviceId(self.devices.len());
        let index_on_node = self.nodes[node.0].devices.len();
        self.devices.push(Device::new(id, node, index_on_node, channel));
        self.nodes[node.0].devices.push(id);
        self.channels[channel.0].devices.push(id);
        self.routing.mark_dirty();
        id
    }

    /// 指定 Wi-Fi 信道的 AP 设备
    pub fn set_access_point(&mut self, channel: ChannelId, dev: DeviceId) {
        self.channels[channel.0].ap = Some(dev);
        self.routing.mark_dirty();
    }

    pub fn assign_address(&mut self, dev: DeviceId, addr: Ipv4Addr) {
        if let Some(old) = self.devices[dev.0].addr.replace(addr) {
            self.addrs.remove(&old);
        }
        self.addrs.insert(addr, dev);
    }

    pub fn set_queue_capacity_pkts(&mut self, dev: DeviceId, pkts: usize) {
        self.devices[dev.0].queue.set_capacity_pkts(pkts);
    }

    pub fn set_receive_error_model(&mut self, dev: DeviceId, model: Option<RateErrorModel>) {
        self.devices[dev.0].rx_error = model;
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn device(&self, id: DeviceId) -> &Device {
        &self.devices[id.0]
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.0]
    }

    pub fn device_addr(&self, dev: DeviceId) -> Option<Ipv4Addr> {
        self.devices[dev.0].addr
    }

    /// 拥有该地址的节点
    pub fn node_of(&self, addr: Ipv4Addr) -> Option<NodeId> {
        self.addrs.get(&addr).map(|d| self.devices[d.0].node)
    }

    pub fn is_local(&self, node: NodeId, addr: Ipv4Addr) -> bool {
        self.node_of(addr) == Some(node)
    }

    /// 基于当前信道邻接关系计算全局路由
    pub fn populate_routes(&mut self) {
        let mut adj: Vec<Vec<NodeId>> = vec![Vec::new(); self.nodes.len()];
        self.edges.clear();
        for ch in &self.channels {
            for &dev in &ch.devices {
                let from = self.devices[dev.0].node;
                for nb in ch.neighbors(dev) {
                    let to = self.devices[nb.0].node;
                    if from == to {
                        continue;
                    }
                    // 两节点间有多条信道时保留先安装的那条
                    self.edges.entry((from, to)).or_insert((dev, nb));
                    adj[from.0].push(to);
                }
            }
        }
        for list in &mut adj {
            list.sort();
            list.dedup();
        }
        self.routing.build(&adj);
        info!(
            nodes = self.nodes.len(),
            routes = self.routing.len(),
            "🧭 全局路由表已生成"
        );
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// 从 `node` 发往 `dst` 时使用的源地址（出接口地址）
    pub fn source_addr(&self, node: NodeId, dst: Ipv4Addr) -> Option<Ipv4Addr> {
        let dst_node = self.node_of(dst)?;
        if dst_node == node {
            return Some(dst);
        }
        let next = self.routing.next_hop(node, dst_node)?;
        let (dev, _) = self.edges.get(&(node, next))?;
        self.devices[dev.0].addr
    }

    /// 创建数据包（线上长度 = 头部 + 载荷）
    pub fn make_packet(&mut self, src: SocketAddrV4, dst: SocketAddrV4, tcp: TcpSegment) -> Packet {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        Packet {
            id,
            src,
            dst,
            size_bytes: HEADER_BYTES.saturating_add(tcp.payload_len()),
            tcp,
            l2_dst: None,
        }
    }

    /// 从指定节点按路由表发出数据包
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, dst = %pkt.dst))]
    pub fn send_from(&mut self, from: NodeId, mut pkt: Packet, sim: &mut Simulator) {
        let Some(dst_node) = self.node_of(*pkt.dst.ip()) else {
            debug!("目的地址未知，丢弃");
            self.stats.no_route_pkts += 1;
            return;
        };
        if dst_node == from {
            self.deliver_local(from, pkt, sim);
            return;
        }
        let Some(next) = self.routing.next_hop(from, dst_node) else {
            debug!(from = ?from, to = ?dst_node, "无路由，丢弃");
            self.stats.no_route_pkts += 1;
            return;
        };
        let Some(&(dev, peer)) = self.edges.get(&(from, next)) else {
            self.stats.no_route_pkts += 1;
            return;
        };
        trace!(next = ?next, dev = ?dev, "查找下一跳");
        pkt.l2_dst = Some(peer);
        self.enqueue(dev, pkt, sim);
    }

    fn trace_point(&self, dev: DeviceId) -> TracePoint {
        let d = &self.devices[dev.0];
        TracePoint {
            node: d.node,
            dev_index: d.index_on_node,
            kind: self.channels[d.channel.0].kind,
        }
    }

    fn trace_ascii(&mut self, dev: DeviceId, op: TraceOp, now: SimTime, pkt: &Packet) {
        if self.traces.has_ascii(dev) {
            let point = self.trace_point(dev);
            self.traces.ascii(dev, op, now, &point, pkt);
        }
    }

    /// 入队；设备空闲时立即开始发送
    fn enqueue(&mut self, dev: DeviceId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        if self.devices[dev.0].queue.is_full() {
            debug!(dev = ?dev, pkt_id = pkt.id, "队列已满，尾丢弃");
            self.stats.dropped_pkts += 1;
            self.stats.dropped_bytes += pkt.size_bytes as u64;
            self.trace_ascii(dev, TraceOp::Drop, now, &pkt);
            return;
        }
        self.trace_ascii(dev, TraceOp::Enqueue, now, &pkt);
        if let Err(pkt) = self.devices[dev.0].queue.enqueue(pkt) {
            self.stats.dropped_pkts += 1;
            self.stats.dropped_bytes += pkt.size_bytes as u64;
            return;
        }
        if !self.devices[dev.0].transmitting {
            self.start_tx(dev, sim);
        }
    }

    /// 取队首开始序列化发送
    fn start_tx(&mut self, dev: DeviceId, sim: &mut Simulator) {
        let now = sim.now();
        let Some(pkt) = self.devices[dev.0].queue.dequeue() else {
            return;
        };
        self.trace_ascii(dev, TraceOp::Dequeue, now, &pkt);

        let ch_id = self.devices[dev.0].channel;
        let (kind, rate, delay) = {
            let ch = &self.channels[ch_id.0];
            (ch.kind, ch.rate, ch.delay)
        };
        let tx_time = rate.tx_time(pkt.size_bytes);
        let start = if kind.is_shared() {
            now.max(self.channels[ch_id.0].busy_until)
        } else {
            now.max(self.devices[dev.0].busy_until)
        };
        let depart = start.saturating_add(tx_time);
        if kind.is_shared() {
            self.channels[ch_id.0].busy_until = depart;
        } else {
            self.devices[dev.0].busy_until = depart;
        }
        self.devices[dev.0].transmitting = true;
        let arrive = depart.saturating_add(delay);

        trace!(
            now = ?now,
            start = ?start,
            tx_time = ?tx_time,
            depart = ?depart,
            arrive = ?arrive,
            "计算传输时间"
        );

        self.traces.pcap(dev, start, &pkt);
        sim.schedule(depart, TxComplete { dev });
        match pkt.l2_dst {
            Some(to) => {
                sim.schedule(arrive, FrameArrival { from: dev, to, pkt });
            }
            None => {
                self.stats.no_route_pkts += 1;
            }
        }
    }

    /// 设备完成一次发送：继续发送队列中的下一个
    pub(crate) fn on_tx_complete(&mut self, dev: DeviceId, sim: &mut Simulator) {
        self.devices[dev.0].transmitting = false;
        if !self.devices[dev.0].queue.is_empty() {
            self.start_tx(dev, sim);
        }
    }

    /// 帧到达接收设备
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id))]
    pub(crate) fn on_frame_arrival(&mut self, from: DeviceId, to: DeviceId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();

        // 共享介质上的混杂模式抓包：其它设备也能“看到”这个帧
        let ch_id = self.devices[to.0].channel;
        if self.channels[ch_id.0].kind.is_shared() {
            let sniffers: Vec<DeviceId> = self.channels[ch_id.0]
                .devices
                .iter()
                .copied()
                .filter(|d| *d != from && *d != to && self.traces.is_promiscuous(*d))
                .collect();
            for d in sniffers {
                self.traces.pcap(d, now, &pkt);
            }
        }

        if let Some(model) = self.devices[to.0].rx_error {
            if model.corrupts(pkt.size_bytes, &mut self.rng) {
                debug!(dev = ?to, "接收误码，丢弃");
                self.stats.corrupted_pkts += 1;
                self.trace_ascii(to, TraceOp::RxDrop, now, &pkt);
                return;
            }
        }

        self.trace_ascii(to, TraceOp::Receive, now, &pkt);
        self.traces.pcap(to, now, &pkt);

        let node = self.devices[to.0].node;
        if self.is_local(node, *pkt.dst.ip()) {
            self.deliver_local(node, pkt, sim);
        } else {
            self.send_from(node, pkt, sim);
        }
    }

    /// 数据包到达目的主机：统计并交给 TCP
    fn deliver_local(&mut self, node: NodeId, pkt: Packet, sim: &mut Simulator) {
        self.stats.delivered_pkts += 1;
        self.stats.delivered_bytes += pkt.size_bytes as u64;
        trace!(node = ?node, pkt_id = pkt.id, "数据包送达目的主机");

        // 规避同时借用 `self` 与 `self.tcp`
        let mut tcp = std::mem::take(&mut self.tcp);
        tcp.on_segment(node, pkt, sim, self);
        self.tcp = tcp;
    }

    /// 为设备开启 pcap：文件名 `<prefix>-<node>-<device>.pcap`
    pub fn enable_pcap(
        &mut self,
        dev: DeviceId,
        dir: &Path,
        prefix: &str,
        promiscuous: bool,
    ) -> Result<PathBuf, TraceError> {
        let d = &self.devices[dev.0];
        let path = dir.join(format!("{}-{}-{}.pcap", prefix, d.node.0, d.index_on_node));
        let out = self.traces.create_file(&path)?;
        self.traces.add_pcap(dev, out, promiscuous)?;
        Ok(path)
    }

    /// 创建一个文本 trace 文件流
    pub fn create_ascii_stream(&mut self, path: &Path) -> Result<AsciiStreamId, TraceError> {
        let out = self.traces.create_file(path)?;
        Ok(self.traces.add_ascii_stream(out))
    }

    pub fn enable_ascii(&mut self, dev: DeviceId, stream: AsciiStreamId) {
        self.traces.attach_ascii(dev, stream);
    }

    /// 刷新所有 trace 输出
    pub fn finish_traces(&mut self) -> Result<(), TraceError> {
        self.traces.finish()
    }
}
