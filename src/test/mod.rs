mod generator;
mod routing_table;
mod scenario;
mod topology;

use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::net::{ChannelKind, DataRate, NetWorld, NodeId, Packet, TcpSegment};
use crate::sim::SimTime;

/// 两节点 p2p：10.0.0.1 (a) <-> 10.0.0.2 (b)
pub(super) fn p2p_pair(world: &mut NetWorld, rate: DataRate, delay: SimTime) -> (NodeId, NodeId) {
    let net = &mut world.net;
    let a = net.add_node("a");
    let b = net.add_node("b");
    let ch = net.add_channel(ChannelKind::PointToPoint, rate, delay);
    let da = net.attach(a, ch);
    let db = net.attach(b, ch);
    net.assign_address(da, Ipv4Addr::new(10, 0, 0, 1));
    net.assign_address(db, Ipv4Addr::new(10, 0, 0, 2));
    net.populate_routes();
    (a, b)
}

pub(super) fn test_packet(id: u64, tcp: TcpSegment) -> Packet {
    Packet {
        id,
        src: SocketAddrV4::new(Ipv4Addr::new(10, 1, 2, 2), 49153),
        dst: SocketAddrV4::new(Ipv4Addr::new(10, 1, 1, 2), 8080),
        size_bytes: 40 + tcp.payload_len(),
        tcp,
        l2_dst: None,
    }
}

pub(super) fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "tcpmix-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}
