use std::net::{Ipv4Addr, SocketAddrV4};

use crate::net::{ChannelKind, NetWorld, NodeId, RateErrorModel};
use crate::topo::{MixedOpts, build_mixed};

#[test]
fn mixed_topology_default_layout_and_addresses() {
    let mut world = NetWorld::default();
    let topo = build_mixed(&mut world, &MixedOpts::default()).expect("build");
    let net = &world.net;

    // n0, n1, 2 个 CSMA 节点, 5 个站点
    assert_eq!(net.nodes().len(), 9);
    // p2p 2 + csma 3 + wifi 6
    assert_eq!(net.devices().len(), 11);

    assert_eq!(topo.p2p_nodes, [NodeId(0), NodeId(1)]);
    assert_eq!(topo.csma_nodes, vec![NodeId(0), NodeId(2), NodeId(3)]);
    assert_eq!(
        topo.wifi_sta_nodes,
        (4..9).map(NodeId).collect::<Vec<_>>()
    );
    assert_eq!(topo.ap, NodeId(0));
    assert_eq!(topo.sink_node(), NodeId(1));
    assert_eq!(topo.sink_addr, SocketAddrV4::new(Ipv4Addr::new(10, 1, 1, 2), 8080));

    assert_eq!(net.device_addr(topo.p2p_devices[0]), Some(Ipv4Addr::new(10, 1, 1, 1)));
    assert_eq!(net.device_addr(topo.csma_devices[0]), Some(Ipv4Addr::new(10, 1, 2, 1)));
    assert_eq!(net.device_addr(topo.csma_devices[2]), Some(Ipv4Addr::new(10, 1, 2, 3)));
    assert_eq!(net.device_addr(topo.sta_devices[0]), Some(Ipv4Addr::new(10, 1, 3, 1)));
    assert_eq!(net.device_addr(topo.sta_devices[4]), Some(Ipv4Addr::new(10, 1, 3, 5)));
    // AP 最后分配
    assert_eq!(net.device_addr(topo.ap_device), Some(Ipv4Addr::new(10, 1, 3, 6)));

    // n0 上的设备序号：p2p 0, csma 1, wifi 2
    assert_eq!(net.device(topo.p2p_devices[0]).index_on_node, 0);
    assert_eq!(net.device(topo.csma_devices[0]).index_on_node, 1);
    assert_eq!(net.device(topo.ap_device).index_on_node, 2);

    let kinds: Vec<ChannelKind> = [topo.p2p_devices[0], topo.csma_devices[1], topo.sta_devices[0]]
        .iter()
        .map(|&d| net.channel(net.device(d).channel).kind)
        .collect();
    assert_eq!(kinds, vec![ChannelKind::PointToPoint, ChannelKind::Csma, ChannelKind::Wifi]);
}

#[test]
fn mixed_topology_device_parameters() {
    let mut world = NetWorld::default();
    let topo = build_mixed(&mut world, &MixedOpts::default()).expect("build");
    let net = &world.net;

    for dev in net.devices() {
        assert_eq!(dev.queue.capacity_pkts(), 10);
    }
    assert_eq!(net.device(topo.p2p_devices[1]).rx_error, Some(RateErrorModel::new(0.000001)));
    assert_eq!(net.device(topo.p2p_devices[0]).rx_error, None);

    let p2p = net.channel(net.device(topo.p2p_devices[0]).channel);
    assert_eq!(p2p.rate.bps(), 5_000_000);
    assert_eq!(p2p.delay.0, 5_000_000);
    let csma = net.channel(net.device(topo.csma_devices[0]).channel);
    assert_eq!(csma.rate.bps(), 100_000_000);
    assert_eq!(csma.delay.0, 6_560);
    let wifi = net.channel(net.device(topo.ap_device).channel);
    assert_eq!(wifi.ap, Some(topo.ap_device));
}

#[test]
fn mixed_topology_routes_every_host_to_the_sink_via_n0() {
    let mut world = NetWorld::default();
    let topo = build_mixed(&mut world, &MixedOpts::default()).expect("build");
    let net = &world.net;
    let sink = topo.sink_node();

    for &host in topo.csma_nodes[1..].iter().chain(topo.wifi_sta_nodes.iter()) {
        assert_eq!(net.routing().next_hop(host, sink), Some(topo.ap), "host {host:?}");
        assert_eq!(net.routing().next_hop(sink, host), Some(topo.ap));
    }
    // 站点之间经 AP 转发
    assert_eq!(
        net.routing().next_hop(topo.wifi_sta_nodes[0], topo.wifi_sta_nodes[1]),
        Some(topo.ap)
    );
    // CSMA 节点之间直接可达
    assert_eq!(
        net.routing().next_hop(topo.csma_nodes[1], topo.csma_nodes[2]),
        Some(topo.csma_nodes[2])
    );

    assert_eq!(
        net.source_addr(topo.wifi_sta_nodes[0], *topo.sink_addr.ip()),
        Some(Ipv4Addr::new(10, 1, 3, 1))
    );
    assert_eq!(
        net.source_addr(topo.csma_nodes[1], *topo.sink_addr.ip()),
        Some(Ipv4Addr::new(10, 1, 2, 2))
    );
}

#[test]
fn mixed_topology_honours_host_counts() {
    let mut world = NetWorld::default();
    let opts = MixedOpts {
        n_csma: 0,
        n_wifi: 1,
        ..MixedOpts::default()
    };
    let topo = build_mixed(&mut world, &opts).expect("build");
    assert_eq!(topo.csma_nodes, vec![NodeId(0)]);
    assert_eq!(topo.wifi_sta_nodes, vec![NodeId(2)]);
    assert_eq!(world.net.nodes().len(), 3);
}
