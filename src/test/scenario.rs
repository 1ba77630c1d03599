use std::collections::HashSet;
use std::fs;

use crate::net::{DataRate, NetWorld};
use crate::scenario::{
    self, CaptureSpec, DeviceGroup, FLOW_START, FLOW_STOP, HostRef, PACKET_BUDGET, PACKET_SIZE,
    PcapTarget, RunSummary, ScenarioError, ScenarioTable,
};
use crate::sim::{SimTime, Simulator};
use crate::topo::{MixedOpts, build_mixed};

use super::unique_temp_dir;

#[test]
fn standard_table_has_four_cases() {
    let table = ScenarioTable::standard();
    assert_eq!(table.case_ids().collect::<Vec<_>>(), vec![1, 2, 3, 4]);

    let expect = [(1, 1, 100), (2, 2, 200), (3, 5, 500), (4, 7, 700)];
    for (case_id, count, mbps) in expect {
        let preset = table.lookup(case_id).expect("known case");
        assert_eq!(preset.generator_count(), count, "case {case_id}");
        for flow in &preset.flows {
            assert_eq!(flow.rate, DataRate::from_mbps(mbps));
            assert_eq!(flow.packet_size, PACKET_SIZE);
            assert_eq!(flow.packet_budget, PACKET_BUDGET);
            assert_eq!(flow.start, FLOW_START);
            assert_eq!(flow.stop, FLOW_STOP);
        }
    }

    assert!(table.lookup(0).is_none());
    assert!(table.lookup(5).is_none());
}

#[test]
fn preset_hosts_follow_case_order() {
    let table = ScenarioTable::default();
    let hosts = |c: u32| -> Vec<HostRef> {
        table
            .lookup(c)
            .expect("case")
            .flows
            .iter()
            .map(|f| f.host)
            .collect()
    };
    assert_eq!(hosts(1), vec![HostRef::Csma(1)]);
    assert_eq!(hosts(2), vec![HostRef::Csma(1), HostRef::Csma(2)]);
    assert_eq!(
        hosts(3),
        vec![
            HostRef::Csma(1),
            HostRef::Csma(2),
            HostRef::WifiSta(0),
            HostRef::WifiSta(1),
            HostRef::WifiSta(2)
        ]
    );
    assert_eq!(hosts(4).len(), 7);
    assert_eq!(hosts(4)[6], HostRef::WifiSta(4));
}

#[test]
fn captures_skip_wifi_when_case_has_no_stations() {
    let table = ScenarioTable::standard();

    let case1 = table.lookup(1).expect("case 1");
    assert_eq!(
        case1.captures,
        vec![
            CaptureSpec::Pcap {
                prefix: "csma_case1".into(),
                targets: vec![PcapTarget::Csma(1)],
                promiscuous: true,
            },
            CaptureSpec::Pcap {
                prefix: "p2p_case1".into(),
                targets: vec![PcapTarget::All(DeviceGroup::P2p)],
                promiscuous: false,
            },
            CaptureSpec::Ascii {
                file: "tcp-example_case1.tr".into(),
                group: DeviceGroup::P2p,
            },
            CaptureSpec::Ascii {
                file: "tcp-example_csma_case1.tr".into(),
                group: DeviceGroup::Csma,
            },
        ]
    );

    let case3 = table.lookup(3).expect("case 3");
    assert!(case3.captures.contains(&CaptureSpec::Pcap {
        prefix: "phy_case3".into(),
        targets: vec![PcapTarget::WifiSta(0), PcapTarget::WifiSta(1), PcapTarget::WifiSta(2)],
        promiscuous: true,
    }));
    assert!(case3.captures.contains(&CaptureSpec::Ascii {
        file: "tcp-example_wifi_case3.tr".into(),
        group: DeviceGroup::Wifi,
    }));
}

#[test]
fn unknown_case_installs_nothing() {
    let dir = unique_temp_dir("scenario-idle");
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let topo = build_mixed(&mut world, &MixedOpts::default()).expect("build");
    let sink = scenario::install_sink(&mut world, &mut sim, &topo, FLOW_STOP);

    let table = ScenarioTable::standard();
    let installed =
        scenario::install(&mut world, &mut sim, &topo, table.lookup(9), &dir, true).expect("install");
    assert!(installed.case_id.is_none());
    assert!(installed.generators.is_empty());
    assert!(installed.trace_files.is_empty());
    assert_eq!(world.apps.len(), 1);

    sim.stop_at(FLOW_STOP);
    sim.run(&mut world);
    assert_eq!(sim.now(), FLOW_STOP);
    let summary = RunSummary::collect(&world, &sim, &installed, sink);
    assert_eq!(summary.end_s, 10.0);
    assert_eq!(summary.total_sent(), 0);
    assert_eq!(summary.sink_rx_bytes, 0);
    assert_eq!(summary.net.delivered_pkts, 0);
    assert_eq!(fs::read_dir(&dir).expect("dir").count(), 0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn case_one_writes_expected_trace_files_and_sends() {
    let dir = unique_temp_dir("scenario-case1");
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let topo = build_mixed(&mut world, &MixedOpts::default()).expect("build");
    let sink = scenario::install_sink(&mut world, &mut sim, &topo, FLOW_STOP);

    let table = ScenarioTable::standard();
    let installed =
        scenario::install(&mut world, &mut sim, &topo, table.lookup(1), &dir, true).expect("install");
    assert_eq!(installed.case_id, Some(1));
    assert_eq!(installed.generators.len(), 1);

    let names: HashSet<String> = installed
        .trace_files
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_owned))
        .collect();
    let expected: HashSet<String> = [
        "csma_case1-2-0.pcap",
        "p2p_case1-0-0.pcap",
        "p2p_case1-1-0.pcap",
        "tcp-example_case1.tr",
        "tcp-example_csma_case1.tr",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect();
    assert_eq!(names, expected);

    sim.run_until(SimTime::from_millis(1_050), &mut world);
    world.net.finish_traces().expect("flush");

    let summary = RunSummary::collect(&world, &sim, &installed, sink);
    let flow = &summary.generators[0];
    assert_eq!(flow.host, HostRef::Csma(1));
    assert_eq!(flow.node, 2);
    assert_eq!(flow.rate_bps, 100_000_000);
    assert!(flow.sent > 0);
    assert_eq!(flow.first_send_s, Some(1.0));
    // 数据经 CSMA、n0、p2p 到达 n1 并被确认
    assert!(flow.acked_bytes > 0);
    assert!(summary.sink_rx_bytes > 0);
    assert!(summary.pcap_records > 0);
    assert!(summary.ascii_lines > 0);

    let csma_tr = fs::read_to_string(dir.join("tcp-example_csma_case1.tr")).expect("csma trace");
    assert!(csma_tr.contains("/CsmaNetDevice/"));
    let p2p_tr = fs::read_to_string(dir.join("tcp-example_case1.tr")).expect("p2p trace");
    assert!(p2p_tr.contains("/NodeList/0/DeviceList/0/PointToPointNetDevice/TxQueue/Enqueue"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn case_four_puts_one_generator_per_host() {
    let dir = unique_temp_dir("scenario-case4");
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let topo = build_mixed(&mut world, &MixedOpts::default()).expect("build");
    scenario::install_sink(&mut world, &mut sim, &topo, FLOW_STOP);

    let table = ScenarioTable::standard();
    let installed =
        scenario::install(&mut world, &mut sim, &topo, table.lookup(4), &dir, false).expect("install");
    assert_eq!(installed.generators.len(), 7);
    assert!(installed.trace_files.is_empty());

    let nodes: HashSet<usize> = installed
        .generators
        .iter()
        .filter_map(|&(app, _)| world.apps.node(app))
        .map(|n| n.0)
        .collect();
    assert_eq!(nodes, (2..9).collect::<HashSet<_>>());

    for &(app, _) in &installed.generators {
        let g = world.apps.generator(app).expect("generator");
        assert!(g.is_configured());
        assert_eq!(g.peer(), Some(topo.sink_addr));
        assert_eq!(world.apps.window(app), Some((FLOW_START, FLOW_STOP)));
    }
    assert_eq!(fs::read_dir(&dir).expect("dir").count(), 0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn case_four_full_run_stops_every_generator_at_stop_time() {
    let dir = unique_temp_dir("scenario-case4-run");
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let topo = build_mixed(&mut world, &MixedOpts::default()).expect("build");
    let sink = scenario::install_sink(&mut world, &mut sim, &topo, FLOW_STOP);

    let table = ScenarioTable::standard();
    let installed =
        scenario::install(&mut world, &mut sim, &topo, table.lookup(4), &dir, false).expect("install");

    sim.stop_at(FLOW_STOP);
    sim.run(&mut world);
    assert_eq!(sim.now(), FLOW_STOP);

    let lifetime = FLOW_STOP.saturating_sub(FLOW_START);
    for &(app, host) in &installed.generators {
        let g = world.apps.generator(app).expect("generator");
        let interval = g.interval().expect("interval");
        let expected = PACKET_BUDGET.min(lifetime.0 / interval.0 + 1);
        assert_eq!(g.sent_count(), expected, "{host}");
        assert!(!g.is_running(), "{host}");
        assert_eq!(g.pending_send(), None, "{host}");
    }

    let summary = RunSummary::collect(&world, &sim, &installed, sink);
    assert_eq!(summary.generators.len(), 7);
    assert!(summary.sink_rx_bytes > 0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_host_is_reported_before_anything_is_installed() {
    let dir = unique_temp_dir("scenario-missing");
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let opts = MixedOpts {
        n_csma: 1,
        ..MixedOpts::default()
    };
    let topo = build_mixed(&mut world, &opts).expect("build");

    let table = ScenarioTable::standard();
    let err = scenario::install(&mut world, &mut sim, &topo, table.lookup(2), &dir, true)
        .expect_err("csma[2] does not exist");
    assert!(matches!(
        err,
        ScenarioError::MissingHost {
            case_id: 2,
            host: HostRef::Csma(2)
        }
    ));
    assert!(world.apps.is_empty());
    assert!(world.net.traces.files().is_empty());

    let _ = fs::remove_dir_all(&dir);
}
