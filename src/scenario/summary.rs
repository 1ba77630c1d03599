//! 运行结果汇总（可序列化为 JSON）

use std::path::PathBuf;

use serde::Serialize;

use super::{HostRef, Installed};
use crate::app::AppId;
use crate::net::{NetWorld, SocketApi, Stats};
use crate::sim::{SimTime, Simulator};

#[derive(Debug, Clone, Serialize)]
pub struct FlowSummary {
    pub app: usize,
    pub host: HostRef,
    pub node: usize,
    pub rate_bps: u64,
    pub packet_size: u32,
    pub packet_budget: u64,
    pub sent: u64,
    pub send_failures: u64,
    pub first_send_s: Option<f64>,
    pub last_send_s: Option<f64>,
    /// 发生器写入速率（bit/s），按首末两次写入之间计算
    pub offered_bps: Option<f64>,
    /// 传输层累计确认的字节数
    pub acked_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub case_id: Option<u32>,
    pub generators: Vec<FlowSummary>,
    pub sink_rx_bytes: u64,
    pub end_s: f64,
    pub executed_events: u64,
    pub net: Stats,
    pub pcap_records: u64,
    pub ascii_lines: u64,
    pub trace_files: Vec<PathBuf>,
}

fn offered_bps(sent: u64, size: u32, first: Option<SimTime>, last: Option<SimTime>) -> Option<f64> {
    let (first, last) = (first?, last?);
    let dur = last.saturating_sub(first);
    if sent < 2 || dur == SimTime::ZERO {
        return None;
    }
    // 最后一个单元之后的间隔不计入
    let bits = (sent - 1) as f64 * size as f64 * 8.0;
    Some(bits / dur.as_secs_f64())
}

impl RunSummary {
    pub fn collect(world: &NetWorld, sim: &Simulator, installed: &Installed, sink: AppId) -> Self {
        let generators = installed
            .generators
            .iter()
            .filter_map(|&(app, host)| {
                let g = world.apps.generator(app)?;
                let node = world.apps.node(app)?;
                let acked_bytes = g
                    .socket()
                    .and_then(|s| world.net.tcp.socket(s))
                    .map_or(0, |s| s.bytes_acked());
                let size = g.packet_size().unwrap_or(0);
                Some(FlowSummary {
                    app: app.0,
                    host,
                    node: node.0,
                    rate_bps: g.rate().map_or(0, |r| r.bps()),
                    packet_size: size,
                    packet_budget: g.packet_budget().unwrap_or(0),
                    sent: g.sent_count(),
                    send_failures: g.send_failures(),
                    first_send_s: g.first_send_at().map(SimTime::as_secs_f64),
                    last_send_s: g.last_send_at().map(SimTime::as_secs_f64),
                    offered_bps: offered_bps(g.sent_count(), size, g.first_send_at(), g.last_send_at()),
                    acked_bytes,
                })
            })
            .collect();

        // sink 停止时记录一次；若仿真在此之前结束，则直接读 socket
        let sink_rx_bytes = world
            .apps
            .sink(sink)
            .map_or(0, |s| match s.socket() {
                Some(sock) if s.is_listening() => world.net.received_bytes(sock),
                _ => s.total_rx(),
            });

        let (pcap_records, ascii_lines) = world.net.traces.counts();
        Self {
            case_id: installed.case_id,
            generators,
            sink_rx_bytes,
            end_s: sim.now().as_secs_f64(),
            executed_events: sim.executed_events(),
            net: world.net.stats.clone(),
            pcap_records,
            ascii_lines,
            trace_files: installed.trace_files.clone(),
        }
    }

    pub fn total_sent(&self) -> u64 {
        self.generators.iter().map(|g| g.sent).sum()
    }
}
