use std::net::{Ipv4Addr, SocketAddrV4};

use crate::app::{AppContext, AppId, Application, GeneratorError, PacketSink, TrafficGenerator};
use crate::net::{DataRate, NetWorld, NodeId, SocketApi, SocketError, SocketId};
use crate::sim::{SimTime, Simulator};

use super::p2p_pair;

const PEER: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 8080);

/// 记录调用的假传输层
#[derive(Default)]
struct MockSockets {
    calls: Vec<&'static str>,
    bind_error: Option<SocketError>,
    connect_error: Option<SocketError>,
    close_error: Option<SocketError>,
    send_error: Option<SocketError>,
    written: u64,
}

impl SocketApi for MockSockets {
    fn create_socket(&mut self, _node: NodeId) -> SocketId {
        self.calls.push("create");
        SocketId(0)
    }

    fn bind(&mut self, _sock: SocketId) -> Result<SocketAddrV4, SocketError> {
        self.calls.push("bind");
        match self.bind_error.clone() {
            Some(e) => Err(e),
            None => Ok(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 49153)),
        }
    }

    fn bind_port(&mut self, _sock: SocketId, port: u16) -> Result<SocketAddrV4, SocketError> {
        self.calls.push("bind_port");
        Ok(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
    }

    fn listen(&mut self, _sock: SocketId) -> Result<(), SocketError> {
        self.calls.push("listen");
        Ok(())
    }

    fn connect(
        &mut self,
        _sock: SocketId,
        _peer: SocketAddrV4,
        _sim: &mut Simulator,
    ) -> Result<(), SocketError> {
        self.calls.push("connect");
        match self.connect_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn send(&mut self, _sock: SocketId, len: u32, _sim: &mut Simulator) -> Result<u32, SocketError> {
        self.calls.push("send");
        match self.send_error.clone() {
            Some(e) => Err(e),
            None => {
                self.written += len as u64;
                Ok(len)
            }
        }
    }

    fn close(&mut self, _sock: SocketId, _sim: &mut Simulator) -> Result<(), SocketError> {
        self.calls.push("close");
        match self.close_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn received_bytes(&self, _sock: SocketId) -> u64 {
        0
    }
}

fn ctx<'a>(sim: &'a mut Simulator, net: &'a mut MockSockets) -> AppContext<'a> {
    AppContext {
        app: AppId(0),
        node: NodeId(0),
        sim,
        net,
    }
}

fn configured(size: u32, budget: u64, mbps: u64) -> TrafficGenerator {
    let mut g = TrafficGenerator::new();
    g.configure(SocketId(0), PEER, size, budget, DataRate::from_mbps(mbps))
        .expect("configure");
    g
}

#[test]
fn generator_configure_rejects_zero_parameters() {
    let mut g = TrafficGenerator::new();
    for (size, budget, rate) in [(0, 10, 1), (1460, 0, 1), (1460, 10, 0)] {
        let err = g
            .configure(SocketId(0), PEER, size, budget, DataRate::from_mbps(rate))
            .expect_err("invalid");
        assert!(matches!(err, GeneratorError::InvalidConfiguration(_)));
    }
    assert!(!g.is_configured());

    assert!(g.configure(SocketId(0), PEER, 1460, 10, DataRate::from_mbps(1)).is_ok());
    assert!(g.is_configured());
    assert!(!g.is_running());
    assert_eq!(g.sent_count(), 0);
    assert_eq!(g.peer(), Some(PEER));
}

#[test]
fn generator_interval_is_packet_bits_over_rate() {
    assert_eq!(configured(1460, 1, 100).interval(), Some(SimTime(116_800)));
    assert_eq!(configured(1460, 1, 700).interval(), Some(SimTime(16_686)));
    assert_eq!(configured(1000, 1, 1).interval(), Some(SimTime::from_millis(8)));
    assert_eq!(TrafficGenerator::new().interval(), None);
}

#[test]
fn generator_activate_requires_configuration_and_rejects_double_start() {
    let mut sim = Simulator::default();
    let mut net = MockSockets::default();

    let mut idle = TrafficGenerator::new();
    assert!(matches!(
        idle.activate(&mut ctx(&mut sim, &mut net)),
        Err(GeneratorError::NotConfigured)
    ));
    assert!(net.calls.is_empty());

    let mut g = configured(1460, 100, 100);
    g.activate(&mut ctx(&mut sim, &mut net)).expect("activate");
    assert!(matches!(
        g.activate(&mut ctx(&mut sim, &mut net)),
        Err(GeneratorError::AlreadyRunning)
    ));
}

#[test]
fn generator_activate_binds_connects_and_sends_first_unit() {
    let mut sim = Simulator::default();
    let mut net = MockSockets::default();
    let mut g = configured(1460, 100, 100);

    g.activate(&mut ctx(&mut sim, &mut net)).expect("activate");

    assert_eq!(net.calls, vec!["bind", "connect", "send"]);
    assert_eq!(net.written, 1460);
    assert!(g.is_running());
    assert_eq!(g.sent_count(), 1);
    let pending = g.pending_send().expect("next send scheduled");
    assert!(sim.is_pending(pending));
    assert_eq!(sim.pending_events(), 1);
}

#[test]
fn generator_with_budget_of_one_schedules_nothing() {
    let mut sim = Simulator::default();
    let mut net = MockSockets::default();
    let mut g = configured(1460, 1, 100);

    g.activate(&mut ctx(&mut sim, &mut net)).expect("activate");
    assert_eq!(g.sent_count(), 1);
    assert_eq!(g.pending_send(), None);
    assert_eq!(sim.pending_events(), 0);
}

#[test]
fn generator_transport_errors_propagate_from_activate() {
    let mut sim = Simulator::default();
    let mut net = MockSockets {
        bind_error: Some(SocketError::PortsExhausted),
        ..MockSockets::default()
    };
    let mut g = configured(1460, 100, 100);

    let err = g.activate(&mut ctx(&mut sim, &mut net)).expect_err("bind fails");
    assert!(matches!(err, GeneratorError::Transport(SocketError::PortsExhausted)));
    assert!(!g.is_running());
    assert_eq!(g.pending_send(), None);
    assert_eq!(net.calls, vec!["bind"]);
}

#[test]
fn generator_closes_bound_socket_when_connect_failed() {
    let mut sim = Simulator::default();
    let mut net = MockSockets {
        connect_error: Some(SocketError::NoRoute(*PEER.ip())),
        ..MockSockets::default()
    };
    let mut g = configured(1460, 100, 100);

    let err = g.activate(&mut ctx(&mut sim, &mut net)).expect_err("connect fails");
    assert!(matches!(err, GeneratorError::Transport(SocketError::NoRoute(_))));
    assert!(!g.is_running());
    assert_eq!(net.calls, vec!["bind", "connect"]);

    g.deactivate(&mut ctx(&mut sim, &mut net));
    g.deactivate(&mut ctx(&mut sim, &mut net));
    assert_eq!(net.calls, vec!["bind", "connect", "close"]);
}

#[test]
fn sink_deactivate_tolerates_close_errors() {
    let mut sim = Simulator::default();
    let mut net = MockSockets {
        close_error: Some(SocketError::Closed),
        ..MockSockets::default()
    };
    let mut sink = PacketSink::new(8080);

    sink.activate(&mut ctx(&mut sim, &mut net)).expect("activate");
    assert!(sink.is_listening());
    sink.deactivate(&mut ctx(&mut sim, &mut net));
    assert!(!sink.is_listening());
    sink.deactivate(&mut ctx(&mut sim, &mut net));
    assert_eq!(net.calls, vec!["create", "bind_port", "listen", "close"]);
}

#[test]
fn generator_counts_rejected_writes_against_the_budget() {
    let mut sim = Simulator::default();
    let mut net = MockSockets {
        send_error: Some(SocketError::SendBufferFull {
            requested: 1460,
            available: 0,
        }),
        ..MockSockets::default()
    };
    let mut g = configured(1460, 100, 100);

    g.activate(&mut ctx(&mut sim, &mut net)).expect("send errors do not fail activation");
    assert_eq!(g.sent_count(), 1);
    assert_eq!(g.send_failures(), 1);
    assert!(g.pending_send().is_some());
}

#[test]
fn generator_deactivate_before_activate_is_a_no_op() {
    let mut sim = Simulator::default();
    let mut net = MockSockets::default();
    let mut g = configured(1460, 100, 100);

    g.deactivate(&mut ctx(&mut sim, &mut net));
    g.deactivate(&mut ctx(&mut sim, &mut net));

    assert!(net.calls.is_empty());
    assert_eq!(g.pending_send(), None);
    assert_eq!(sim.pending_events(), 0);
    assert!(!g.is_running());

    // 未配置的发生器同样可以停止
    TrafficGenerator::new().deactivate(&mut ctx(&mut sim, &mut net));
    assert!(net.calls.is_empty());
}

#[test]
fn generator_deactivate_cancels_pending_send_and_is_idempotent() {
    let mut sim = Simulator::default();
    let mut net = MockSockets::default();
    let mut g = configured(1460, 100, 100);
    g.activate(&mut ctx(&mut sim, &mut net)).expect("activate");
    let pending = g.pending_send().expect("pending");

    g.deactivate(&mut ctx(&mut sim, &mut net));
    assert!(!sim.is_pending(pending));
    assert_eq!(g.pending_send(), None);
    assert!(!g.is_running());

    g.deactivate(&mut ctx(&mut sim, &mut net));
    assert_eq!(net.calls.iter().filter(|c| **c == "close").count(), 1);
    assert_eq!(g.sent_count(), 1);
}

/// p2p 上安装 sink 与一个发生器，返回 (发生器, sink)
fn install_pair(
    world: &mut NetWorld,
    sim: &mut Simulator,
    size: u32,
    budget: u64,
    rate: DataRate,
    start: SimTime,
    stop: SimTime,
) -> (AppId, AppId) {
    let (a, b) = p2p_pair(world, DataRate::from_mbps(5), SimTime::from_millis(5));
    let sink = world
        .apps
        .install(b, PacketSink::new(PEER.port()), SimTime::ZERO, SimTime::from_secs(30), sim);

    let sock = world.net.create_socket(a);
    let mut g = TrafficGenerator::new();
    g.configure(sock, PEER, size, budget, rate).expect("configure");
    let app = world.apps.install(a, g, start, stop, sim);
    (app, sink)
}

#[test]
fn generator_sends_one_unit_per_interval_until_stopped() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    // 1000 B @ 1 Mbps -> 8 ms；存活 1.005 s -> floor(1.005 / 0.008) + 1 = 126
    let (app, sink) = install_pair(
        &mut world,
        &mut sim,
        1000,
        1_000_000,
        DataRate::from_mbps(1),
        SimTime::from_secs(1),
        SimTime::from_millis(2_005),
    );

    sim.run_until(SimTime::from_secs(10), &mut world);

    let g = world.apps.generator(app).expect("generator");
    assert_eq!(g.sent_count(), 126);
    assert_eq!(g.send_failures(), 0);
    assert!(!g.is_running());
    assert_eq!(g.pending_send(), None);
    assert_eq!(g.first_send_at(), Some(SimTime::from_secs(1)));
    assert_eq!(g.last_send_at(), Some(SimTime::from_millis(2_000)));

    let sock = world.apps.sink(sink).and_then(|s| s.socket()).expect("sink socket");
    assert_eq!(world.net.received_bytes(sock), 126_000);
}

#[test]
fn generator_stops_at_budget_before_stop_time() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let (app, _sink) = install_pair(
        &mut world,
        &mut sim,
        1000,
        10,
        DataRate::from_mbps(1),
        SimTime::from_secs(1),
        SimTime::from_secs(10),
    );

    sim.run_until(SimTime::from_secs(5), &mut world);

    let g = world.apps.generator(app).expect("generator");
    assert_eq!(g.sent_count(), 10);
    assert_eq!(g.pending_send(), None);
    // 仍在运行，直到停止时刻
    assert!(g.is_running());
    assert_eq!(g.last_send_at(), Some(SimTime::from_millis(1_072)));
}

#[test]
fn generator_cancelled_before_second_send_stays_at_one() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let (app, _sink) = install_pair(
        &mut world,
        &mut sim,
        1000,
        1_000_000,
        DataRate::from_mbps(1),
        SimTime::from_secs(1),
        SimTime::from_millis(1_004),
    );

    sim.run_until(SimTime::from_secs(10), &mut world);

    let g = world.apps.generator(app).expect("generator");
    assert_eq!(g.sent_count(), 1);
    assert!(!g.is_running());
}

#[test]
fn generator_offered_rate_matches_configured_rate() {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let rate = DataRate::from_mbps(2);
    let (app, _sink) = install_pair(
        &mut world,
        &mut sim,
        1460,
        1_000_000,
        rate,
        SimTime::from_secs(1),
        SimTime::from_secs(3),
    );

    sim.run_until(SimTime::from_secs(3), &mut world);

    let g = world.apps.generator(app).expect("generator");
    let first = g.first_send_at().expect("first");
    let last = g.last_send_at().expect("last");
    let bits = (g.sent_count() - 1) as f64 * 1460.0 * 8.0;
    let measured = bits / last.saturating_sub(first).as_secs_f64();
    let err = (measured - rate.bps() as f64).abs() / rate.bps() as f64;
    assert!(err < 1e-3, "measured {measured} bps");
}
