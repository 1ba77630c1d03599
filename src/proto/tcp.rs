//! TCP（简化版）协议实现
//!
//! 面向 socket 的字节流传输，支持仿真实验所需的最小功能：
//! - 三次握手（SYN / SYN-ACK / ACK），SYN 丢失时按 RTO 重传
//! - 发送缓冲上限，写入超过剩余空间时整体失败
//! - 累计 ACK，接收端缓存乱序段
//! - Reno 风格拥塞控制：慢启动 + AIMD，3 dupACK 快速重传，NewReno 部分 ACK
//! - RFC 6298 风格的 RTO 估计与指数退避；超时后 go-back-N
//!
//! 注意：这是仿真用途的“极简 TCP”，不实现 FIN/窗口通告/选择确认等。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::{Ipv4Addr, SocketAddrV4};

use tracing::{debug, trace};

use crate::net::{Network, NodeId, Packet, SocketError, SocketId, TcpSegment, with_tcp_stack};
use crate::sim::{Event, EventId, SimTime, Simulator, World};

/// 第一个临时端口
pub const EPHEMERAL_PORT_START: u16 = 49153;

#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// MSS（数据段载荷大小，字节）
    pub mss: u32,
    /// 发送缓冲（字节），包含未发送与未确认的数据
    pub snd_buf_bytes: u64,
    /// 初始 cwnd（字节）
    pub init_cwnd_bytes: u64,
    /// 初始 ssthresh（字节）
    pub init_ssthresh_bytes: u64,
    /// 初始 RTO
    pub init_rto: SimTime,
    /// 最小 RTO
    pub min_rto: SimTime,
    /// 最大 RTO（用于退避上限）
    pub max_rto: SimTime,
    /// 触发快速重传的 dupACK 个数
    pub dup_ack_threshold: u32,
}

impl Default for TcpConfig {
    fn default() -> Self {
        let mss = 1460;
        Self {
            mss,
            snd_buf_bytes: 131_072,
            init_cwnd_bytes: (mss as u64).saturating_mul(10),
            init_ssthresh_bytes: u64::MAX / 2,
            init_rto: SimTime::from_secs(1),
            min_rto: SimTime::from_millis(200),
            max_rto: SimTime::from_secs(60),
            dup_ack_threshold: 3,
        }
    }
}

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    Unbound,
    Bound,
    Listening,
    SynSent,
    SynReceived,
    Established,
    /// 应用已关闭，剩余数据仍在发送
    Closing,
    Closed,
}

#[derive(Debug, Clone)]
struct SentSeg {
    len: u32,
    sent_at: SimTime,
    retrans: bool,
}

#[derive(Debug, Clone)]
pub struct TcpSocket {
    pub id: SocketId,
    pub node: NodeId,
    state: TcpState,
    local: SocketAddrV4,
    remote: Option<SocketAddrV4>,
    parent: Option<SocketId>,
    children: Vec<SocketId>,

    // sender
    unsent: u64,
    snd_una: u64,
    snd_nxt: u64,
    high_tx: u64,
    cwnd_bytes: u64,
    ssthresh_bytes: u64,
    dup_acks: u32,
    recover: Option<u64>,
    rto: SimTime,
    srtt: Option<SimTime>,
    rttvar: SimTime,
    rto_timer: Option<EventId>,
    inflight: BTreeMap<u64, SentSeg>, // seq -> segment

    // receiver
    rcv_nxt: u64,
    ooo: BTreeMap<u64, u32>,

    // stats
    retransmits: u64,
    timeouts: u64,
}

impl TcpSocket {
    fn new(id: SocketId, node: NodeId, cfg: &TcpConfig) -> Self {
        Self {
            id,
            node,
            state: TcpState::Unbound,
            local: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
            remote: None,
            parent: None,
            children: Vec::new(),
            unsent: 0,
            snd_una: 0,
            snd_nxt: 0,
            high_tx: 0,
            cwnd_bytes: cfg.init_cwnd_bytes.max(cfg.mss as u64),
            ssthresh_bytes: cfg.init_ssthresh_bytes.max(cfg.mss as u64),
            dup_acks: 0,
            recover: None,
            rto: cfg.init_rto,
            srtt: None,
            rttvar: SimTime::ZERO,
            rto_timer: None,
            inflight: BTreeMap::new(),
            rcv_nxt: 0,
            ooo: BTreeMap::new(),
            retransmits: 0,
            timeouts: 0,
        }
    }

    pub fn state(&self) -> TcpState {
        self.state
    }

    pub fn local(&self) -> SocketAddrV4 {
        self.local
    }

    pub fn remote(&self) -> Option<SocketAddrV4> {
        self.remote
    }

    pub fn children(&self) -> &[SocketId] {
        &self.children
    }

    pub fn cwnd_bytes(&self) -> u64 {
        self.cwnd_bytes
    }

    pub fn ssthresh_bytes(&self) -> u64 {
        self.ssthresh_bytes
    }

    /// 已被累计确认的字节数
    pub fn bytes_acked(&self) -> u64 {
        self.snd_una
    }

    /// 按序收到的字节数
    pub fn rx_bytes(&self) -> u64 {
        self.rcv_nxt
    }

    /// 尚未发出的缓冲字节数
    pub fn unsent_bytes(&self) -> u64 {
        self.unsent
    }

    pub fn flight_bytes(&self) -> u64 {
        self.snd_nxt - self.snd_una
    }

    pub fn retransmits(&self) -> u64 {
        self.retransmits
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }

    pub fn rto(&self) -> SimTime {
        self.rto
    }

    fn emit(&self, seg: TcpSegment, sim: &mut Simulator, net: &mut Network) {
        let Some(remote) = self.remote else {
            return;
        };
        let pkt = net.make_packet(self.local, remote, seg);
        net.send_from(self.node, pkt, sim);
    }

    fn arm_timer(&mut self, sim: &mut Simulator) {
        if let Some(t) = self.rto_timer.take() {
            sim.cancel(t);
        }
        self.rto_timer = Some(sim.schedule_after(self.rto, TcpTimer { sock: self.id }));
    }

    fn cancel_timer(&mut self, sim: &mut Simulator) {
        if let Some(t) = self.rto_timer.take() {
            sim.cancel(t);
        }
    }

    fn backoff(&mut self, cfg: &TcpConfig) {
        self.rto = SimTime(self.rto.0.saturating_mul(2).min(cfg.max_rto.0));
    }

    /// RFC 6298：srtt/rttvar 更新，rto = srtt + 4 * rttvar，限制在 [min_rto, max_rto]
    fn update_rtt(&mut self, sample: SimTime, cfg: &TcpConfig) {
        match self.srtt {
            None => {
                self.srtt = Some(sample);
                self.rttvar = SimTime(sample.0 / 2);
            }
            Some(srtt) => {
                let err = srtt.0.abs_diff(sample.0);
                self.rttvar = SimTime((3 * self.rttvar.0 + err) / 4);
                self.srtt = Some(SimTime((7 * srtt.0 + sample.0) / 8));
            }
        }
        let srtt = self.srtt.unwrap_or(sample);
        let rto = srtt.0.saturating_add(self.rttvar.0.saturating_mul(4).max(1));
        self.rto = SimTime(rto.clamp(cfg.min_rto.0, cfg.max_rto.0));
    }

    /// 在 cwnd 允许的范围内把缓冲数据切成段发出
    fn try_send(&mut self, cfg: &TcpConfig, sim: &mut Simulator, net: &mut Network) {
        if !matches!(self.state, TcpState::Established | TcpState::Closing) {
            return;
        }
        let Some(remote) = self.remote else {
            return;
        };
        let mss = cfg.mss as u64;
        loop {
            let avail = self.cwnd_bytes.saturating_sub(self.flight_bytes());
            let len = mss.min(self.unsent);
            if len == 0 || avail < len {
                break;
            }
            let seq = self.snd_nxt;
            self.snd_nxt += len;
            self.unsent -= len;
            let retrans = seq < self.high_tx;
            if retrans {
                self.retransmits += 1;
            }
            self.high_tx = self.high_tx.max(self.snd_nxt);
            self.inflight.insert(
                seq,
                SentSeg {
                    len: len as u32,
                    sent_at: sim.now(),
                    retrans,
                },
            );

            let pkt = net.make_packet(self.local, remote, TcpSegment::Data { seq, len: len as u32 });
            trace!(sock = ?self.id, seq, len, retrans, "发送数据段");
            net.send_from(self.node, pkt, sim);
        }
        if !self.inflight.is_empty() && self.rto_timer.is_none_or(|t| !sim.is_pending(t)) {
            self.arm_timer(sim);
        }
    }

    /// 重传最早的未确认段
    fn retransmit_head(&mut self, sim: &mut Simulator, net: &mut Network) {
        let now = sim.now();
        let Some((&seq, seg)) = self.inflight.iter_mut().next() else {
            return;
        };
        seg.retrans = true;
        seg.sent_at = now;
        let len = seg.len;
        self.retransmits += 1;
        debug!(sock = ?self.id, seq, len, "快速重传");
        self.emit(TcpSegment::Data { seq, len }, sim, net);
    }

    fn on_ack(&mut self, ack: u64, cfg: &TcpConfig, sim: &mut Simulator, net: &mut Network) {
        let mss = cfg.mss as u64;
        if ack > self.snd_una {
            if ack > self.snd_nxt {
                // go-back-N 之前发出的数据已到达对端
                let skip = ack - self.snd_nxt;
                self.unsent = self.unsent.saturating_sub(skip);
                self.snd_nxt = ack;
                self.high_tx = self.high_tx.max(ack);
            }
            let newly_acked = ack - self.snd_una;
            self.snd_una = ack;

            // 移除已确认段；仅用未重传过的段采样 RTT（Karn）
            let now = sim.now();
            let mut sample = None;
            while let Some((&seq, seg)) = self.inflight.first_key_value() {
                let end = seq + seg.len as u64;
                if end > ack {
                    break;
                }
                if !seg.retrans {
                    sample = Some(now.saturating_sub(seg.sent_at));
                }
                self.inflight.pop_first();
            }
            if let Some(rtt) = sample {
                self.update_rtt(rtt, cfg);
            }

            match self.recover {
                Some(recover) if ack < recover => {
                    // NewReno 部分 ACK：重传下一个缺口，部分收缩窗口
                    self.retransmit_head(sim, net);
                    self.cwnd_bytes = self
                        .cwnd_bytes
                        .saturating_sub(newly_acked)
                        .saturating_add(mss)
                        .max(mss);
                }
                Some(_) => {
                    self.recover = None;
                    self.dup_acks = 0;
                    self.cwnd_bytes = self.ssthresh_bytes.max(mss);
                }
                None => {
                    self.dup_acks = 0;
                    if self.cwnd_bytes < self.ssthresh_bytes {
                        self.cwnd_bytes = self.cwnd_bytes.saturating_add(newly_acked.min(mss));
                    } else {
                        // AIMD：每个 ACK 让 cwnd 以 mss^2/cwnd 增长（至少 +1）
                        let inc = (mss.saturating_mul(mss) / self.cwnd_bytes).max(1);
                        self.cwnd_bytes = self.cwnd_bytes.saturating_add(inc);
                    }
                }
            }

            self.cancel_timer(sim);
            if !self.inflight.is_empty() {
                self.arm_timer(sim);
            }

            if self.state == TcpState::Closing && self.unsent == 0 && self.flight_bytes() == 0 {
                debug!(sock = ?self.id, "数据已全部确认，连接关闭");
                self.state = TcpState::Closed;
                return;
            }
            self.try_send(cfg, sim, net);
        } else if ack == self.snd_una && self.flight_bytes() > 0 {
            self.dup_acks = self.dup_acks.saturating_add(1);
            if self.recover.is_none() && self.dup_acks == cfg.dup_ack_threshold {
                self.ssthresh_bytes = (self.flight_bytes() / 2).max(2 * mss);
                self.cwnd_bytes = self.ssthresh_bytes.saturating_add(3 * mss);
                self.recover = Some(self.snd_nxt);
                self.retransmit_head(sim, net);
            } else if self.recover.is_some() {
                // 快速恢复：每个额外 dupACK 增加 cwnd 一个 MSS
                self.cwnd_bytes = self.cwnd_bytes.saturating_add(mss);
                self.try_send(cfg, sim, net);
            }
        }
    }

    fn on_data(&mut self, seq: u64, len: u32, sim: &mut Simulator, net: &mut Network) {
        let end = seq + len as u64;
        if end > self.rcv_nxt {
            if seq <= self.rcv_nxt {
                self.rcv_nxt = end;
                while let Some((&s, &l)) = self.ooo.first_key_value() {
                    if s > self.rcv_nxt {
                        break;
                    }
                    self.ooo.pop_first();
                    self.rcv_nxt = self.rcv_nxt.max(s + l as u64);
                }
            } else {
                let slot = self.ooo.entry(seq).or_insert(len);
                *slot = (*slot).max(len);
            }
        }
        // 无论是否乱序，都发累计 ACK（dupACK 体现为 ack 不前进）
        self.emit(TcpSegment::Ack { ack: self.rcv_nxt }, sim, net);
    }

    fn on_timeout(&mut self, cfg: &TcpConfig, sim: &mut Simulator, net: &mut Network) {
        self.rto_timer = None;
        match self.state {
            TcpState::SynSent => {
                self.timeouts += 1;
                self.backoff(cfg);
                debug!(sock = ?self.id, rto = ?self.rto, "SYN 超时重传");
                self.emit(TcpSegment::Syn, sim, net);
                self.arm_timer(sim);
            }
            TcpState::Established | TcpState::Closing if self.flight_bytes() > 0 => {
                // 超时：回到慢启动，从最早未确认处重新发送
                let mss = cfg.mss as u64;
                self.timeouts += 1;
                self.ssthresh_bytes = (self.flight_bytes() / 2).max(2 * mss);
                self.cwnd_bytes = mss;
                self.dup_acks = 0;
                self.recover = None;
                self.backoff(cfg);
                self.unsent += self.flight_bytes();
                self.snd_nxt = self.snd_una;
                self.inflight.clear();
                debug!(sock = ?self.id, seq = self.snd_una, rto = ?self.rto, "RTO 超时");
                self.try_send(cfg, sim, net);
            }
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct TcpStack {
    cfg: TcpConfig,
    sockets: Vec<TcpSocket>,
    listeners: HashMap<(NodeId, u16), SocketId>,
    conns: HashMap<(NodeId, u16, SocketAddrV4), SocketId>,
    bound_ports: HashSet<(NodeId, u16)>,
    next_ephemeral: HashMap<NodeId, u16>,
}

impl TcpStack {
    pub fn new(cfg: TcpConfig) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TcpConfig {
        &self.cfg
    }

    /// 只影响之后创建的 socket
    pub fn set_config(&mut self, cfg: TcpConfig) {
        self.cfg = cfg;
    }

    pub fn socket(&self, id: SocketId) -> Option<&TcpSocket> {
        self.sockets.get(id.0)
    }

    pub fn sockets(&self) -> &[TcpSocket] {
        &self.sockets
    }

    fn sock_mut(&mut self, id: SocketId) -> Result<&mut TcpSocket, SocketError> {
        self.sockets
            .get_mut(id.0)
            .ok_or(SocketError::UnknownSocket(id))
    }

    pub fn create(&mut self, node: NodeId) -> SocketId {
        let id = SocketId(self.sockets.len());
        self.sockets.push(TcpSocket::new(id, node, &self.cfg));
        id
    }

    fn alloc_ephemeral(&mut self, node: NodeId) -> Result<u16, SocketError> {
        let start = *self.next_ephemeral.get(&node).unwrap_or(&EPHEMERAL_PORT_START);
        let mut port = start;
        loop {
            if !self.bound_ports.contains(&(node, port)) {
                let next = if port == u16::MAX { EPHEMERAL_PORT_START } else { port + 1 };
                self.next_ephemeral.insert(node, next);
                return Ok(port);
            }
            port = if port == u16::MAX { EPHEMERAL_PORT_START } else { port + 1 };
            if port == start {
                return Err(SocketError::PortsExhausted);
            }
        }
    }

    /// 绑定到指定端口；`None` 表示分配临时端口
    pub fn bind(&mut self, id: SocketId, port: Option<u16>) -> Result<SocketAddrV4, SocketError> {
        let sock = self.sock_mut(id)?;
        match sock.state {
            TcpState::Unbound => {}
            TcpState::Closed | TcpState::Closing => return Err(SocketError::Closed),
            _ => return Err(SocketError::AlreadyBound),
        }
        let node = sock.node;
        let port = match port {
            Some(p) if self.bound_ports.contains(&(node, p)) => return Err(SocketError::PortInUse(p)),
            Some(p) => p,
            None => self.alloc_ephemeral(node)?,
        };
        self.bound_ports.insert((node, port));
        let sock = self.sock_mut(id)?;
        sock.local = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        sock.state = TcpState::Bound;
        trace!(sock = ?id, port, "socket 已绑定");
        Ok(sock.local)
    }

    pub fn listen(&mut self, id: SocketId) -> Result<(), SocketError> {
        let sock = self.sock_mut(id)?;
        match sock.state {
            TcpState::Bound => {}
            TcpState::Unbound => return Err(SocketError::NotBound),
            TcpState::Closed | TcpState::Closing => return Err(SocketError::Closed),
            _ => return Err(SocketError::AlreadyConnected),
        }
        sock.state = TcpState::Listening;
        let key = (sock.node, sock.local.port());
        self.listeners.insert(key, id);
        Ok(())
    }

    pub fn connect(
        &mut self,
        id: SocketId,
        peer: SocketAddrV4,
        sim: &mut Simulator,
        net: &mut Network,
    ) -> Result<(), SocketError> {
        let state = self.sock_mut(id)?.state;
        match state {
            TcpState::Unbound => {
                self.bind(id, None)?;
            }
            TcpState::Bound => {}
            TcpState::Closed | TcpState::Closing => return Err(SocketError::Closed),
            _ => return Err(SocketError::AlreadyConnected),
        }
        let node = self.sock_mut(id)?.node;
        let src = net
            .source_addr(node, *peer.ip())
            .ok_or(SocketError::NoRoute(*peer.ip()))?;

        let sock = self.sock_mut(id)?;
        sock.local = SocketAddrV4::new(src, sock.local.port());
        sock.remote = Some(peer);
        sock.state = TcpState::SynSent;
        let key = (node, sock.local.port(), peer);
        debug!(sock = ?id, local = %sock.local, peer = %peer, "发起连接");
        sock.emit(TcpSegment::Syn, sim, net);
        sock.arm_timer(sim);
        self.conns.insert(key, id);
        Ok(())
    }

    pub fn send(
        &mut self,
        id: SocketId,
        len: u32,
        sim: &mut Simulator,
        net: &mut Network,
    ) -> Result<u32, SocketError> {
        let cfg = &self.cfg;
        let sock = self
            .sockets
            .get_mut(id.0)
            .ok_or(SocketError::UnknownSocket(id))?;
        match sock.state {
            TcpState::SynSent | TcpState::Established => {}
            TcpState::Closing | TcpState::Closed => return Err(SocketError::Closed),
            _ => return Err(SocketError::NotConnected),
        }
        let used = sock.unsent + sock.flight_bytes();
        let available = cfg.snd_buf_bytes.saturating_sub(used);
        if len as u64 > available {
            return Err(SocketError::SendBufferFull {
                requested: len,
                available,
            });
        }
        sock.unsent += len as u64;
        sock.try_send(cfg, sim, net);
        Ok(len)
    }

    /// 关闭 socket：监听 socket 同时关闭已接受的连接；已关闭时为 no-op。
    pub fn close(&mut self, id: SocketId, sim: &mut Simulator) -> Result<(), SocketError> {
        let sock = self.sock_mut(id)?;
        match sock.state {
            TcpState::Closed | TcpState::Closing => return Ok(()),
            TcpState::Established if sock.unsent > 0 || sock.flight_bytes() > 0 => {
                sock.state = TcpState::Closing;
                debug!(sock = ?id, "应用关闭，剩余数据继续发送");
                return Ok(());
            }
            TcpState::Listening => {
                let key = (sock.node, sock.local.port());
                let children = std::mem::take(&mut sock.children);
                sock.state = TcpState::Closed;
                self.listeners.remove(&key);
                for c in &children {
                    if let Some(child) = self.sockets.get_mut(c.0) {
                        child.cancel_timer(sim);
                        child.state = TcpState::Closed;
                    }
                }
                // 保留子连接列表用于统计收到的字节
                if let Some(sock) = self.sockets.get_mut(id.0) {
                    sock.children = children;
                }
                return Ok(());
            }
            _ => {}
        }
        sock.cancel_timer(sim);
        sock.state = TcpState::Closed;
        Ok(())
    }

    /// 按序收到的字节数；监听 socket 汇总其接受的全部连接
    pub fn received_bytes(&self, id: SocketId) -> u64 {
        let Some(sock) = self.sockets.get(id.0) else {
            return 0;
        };
        sock.children
            .iter()
            .filter_map(|c| self.sockets.get(c.0))
            .map(|c| c.rx_bytes())
            .sum::<u64>()
            + sock.rx_bytes()
    }

    /// 目的主机收到一个 TCP 段
    pub fn on_segment(&mut self, node: NodeId, pkt: Packet, sim: &mut Simulator, net: &mut Network) {
        let key = (node, pkt.dst.port(), pkt.src);
        if let Some(&id) = self.conns.get(&key) {
            self.on_conn_segment(id, pkt.tcp, sim, net);
            return;
        }
        if pkt.tcp != TcpSegment::Syn {
            trace!(node = ?node, dst = %pkt.dst, "没有匹配的连接，丢弃");
            return;
        }
        let Some(&listener) = self.listeners.get(&(node, pkt.dst.port())) else {
            trace!(node = ?node, dst = %pkt.dst, "端口未监听，丢弃 SYN");
            return;
        };

        // 新连接：派生子 socket
        let child = self.create(node);
        let sock = &mut self.sockets[child.0];
        sock.local = pkt.dst;
        sock.remote = Some(pkt.src);
        sock.parent = Some(listener);
        sock.state = TcpState::SynReceived;
        sock.emit(TcpSegment::SynAck, sim, net);
        self.sockets[listener.0].children.push(child);
        self.conns.insert(key, child);
        debug!(listener = ?listener, child = ?child, peer = %pkt.src, "接受新连接");
    }

    fn on_conn_segment(&mut self, id: SocketId, seg: TcpSegment, sim: &mut Simulator, net: &mut Network) {
        let cfg = &self.cfg;
        let Some(sock) = self.sockets.get_mut(id.0) else {
            return;
        };
        match (sock.state, seg) {
            (TcpState::SynReceived, TcpSegment::Syn) => sock.emit(TcpSegment::SynAck, sim, net),
            (TcpState::SynSent, TcpSegment::SynAck) => {
                sock.state = TcpState::Established;
                sock.cancel_timer(sim);
                sock.emit(TcpSegment::HandshakeAck, sim, net);
                debug!(sock = ?id, "连接已建立");
                sock.try_send(cfg, sim, net);
            }
            (TcpState::Established | TcpState::Closing, TcpSegment::SynAck) => {
                sock.emit(TcpSegment::HandshakeAck, sim, net);
            }
            (TcpState::SynReceived, TcpSegment::HandshakeAck) => {
                sock.state = TcpState::Established;
            }
            (TcpState::SynReceived | TcpState::Established, TcpSegment::Data { seq, len }) => {
                sock.state = TcpState::Established;
                sock.on_data(seq, len, sim, net);
            }
            (TcpState::Established | TcpState::Closing, TcpSegment::Ack { ack }) => {
                sock.on_ack(ack, cfg, sim, net);
            }
            (state, seg) => {
                trace!(sock = ?id, ?state, ?seg, "忽略报文段");
            }
        }
    }

    pub fn on_timer(&mut self, id: SocketId, sim: &mut Simulator, net: &mut Network) {
        let cfg = &self.cfg;
        if let Some(sock) = self.sockets.get_mut(id.0) {
            sock.on_timeout(cfg, sim, net);
        }
    }
}

/// TCP 重传定时器事件
#[derive(Debug)]
pub struct TcpTimer {
    pub sock: SocketId,
}

impl Event for TcpTimer {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TcpTimer { sock } = *self;
        with_tcp_stack(world, |net, tcp| tcp.on_timer(sock, sim, net));
    }
}
