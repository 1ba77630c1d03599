//! 场景选择与安装
//!
//! 按场景编号查表，在混合拓扑上安装 sink、发生器与抓包设置。

mod summary;
mod table;

pub use summary::{FlowSummary, RunSummary};
pub use table::{
    CaptureSpec, DeviceGroup, FLOW_START, FLOW_STOP, FlowSpec, HostRef, PACKET_BUDGET, PACKET_SIZE,
    PcapTarget, ScenarioPreset, ScenarioTable,
};

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::app::{AppId, GeneratorError, PacketSink, TrafficGenerator};
use crate::net::{DeviceId, NetWorld, NodeId, SocketApi};
use crate::sim::{SimTime, Simulator};
use crate::topo::MixedTopology;
use crate::trace::TraceError;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("case {case_id} needs host {host}, which the topology does not have")]
    MissingHost { case_id: u32, host: HostRef },
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error("generator setup failed: {0}")]
    Generator(#[from] GeneratorError),
}

/// 已安装的场景
#[derive(Debug, Clone, Default)]
pub struct Installed {
    pub case_id: Option<u32>,
    pub generators: Vec<(AppId, HostRef)>,
    pub trace_files: Vec<PathBuf>,
}

fn host_node(topo: &MixedTopology, host: HostRef) -> Option<NodeId> {
    match host {
        HostRef::Csma(i) => topo.csma_nodes.get(i).copied(),
        HostRef::WifiSta(i) => topo.wifi_sta_nodes.get(i).copied(),
    }
}

fn group_devices(topo: &MixedTopology, group: DeviceGroup) -> Vec<DeviceId> {
    match group {
        DeviceGroup::P2p => topo.p2p_devices.to_vec(),
        DeviceGroup::Csma => topo.csma_devices.clone(),
        DeviceGroup::Wifi => topo.wifi_devices(),
    }
}

fn pcap_devices(topo: &MixedTopology, target: PcapTarget) -> Vec<DeviceId> {
    match target {
        PcapTarget::Csma(i) => topo.csma_devices.get(i).copied().into_iter().collect(),
        PcapTarget::WifiSta(i) => topo.sta_devices.get(i).copied().into_iter().collect(),
        PcapTarget::All(group) => group_devices(topo, group),
    }
}

/// 在 sink 节点上安装 PacketSink（所有场景都安装）
pub fn install_sink(world: &mut NetWorld, sim: &mut Simulator, topo: &MixedTopology, stop: SimTime) -> AppId {
    let sink = PacketSink::new(topo.sink_addr.port());
    world.apps.install(topo.sink_node(), sink, SimTime::ZERO, stop, sim)
}

/// 开启预设中的抓包与 trace，返回创建的文件
pub fn enable_captures(
    world: &mut NetWorld,
    topo: &MixedTopology,
    preset: &ScenarioPreset,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ScenarioError> {
    let mut files = Vec::new();
    for capture in &preset.captures {
        match capture {
            CaptureSpec::Pcap {
                prefix,
                targets,
                promiscuous,
            } => {
                for &target in targets {
                    for dev in pcap_devices(topo, target) {
                        files.push(world.net.enable_pcap(dev, out_dir, prefix, *promiscuous)?);
                    }
                }
            }
            CaptureSpec::Ascii { file, group } => {
                let path = out_dir.join(file);
                let stream = world.net.create_ascii_stream(&path)?;
                for dev in group_devices(topo, *group) {
                    world.net.enable_ascii(dev, stream);
                }
                files.push(path);
            }
        }
    }
    debug!(case = preset.case_id, files = files.len(), "trace 已开启");
    Ok(files)
}

/// 安装一个场景；`preset` 为 None 时什么都不做。
///
/// 先检查所有主机都存在，再安装发生器，最后开启抓包（`tracing` 为 false 时跳过）。
pub fn install(
    world: &mut NetWorld,
    sim: &mut Simulator,
    topo: &MixedTopology,
    preset: Option<&ScenarioPreset>,
    out_dir: &Path,
    tracing: bool,
) -> Result<Installed, ScenarioError> {
    let Some(preset) = preset else {
        return Ok(Installed::default());
    };

    let mut nodes = Vec::with_capacity(preset.flows.len());
    for flow in &preset.flows {
        let node = host_node(topo, flow.host).ok_or(ScenarioError::MissingHost {
            case_id: preset.case_id,
            host: flow.host,
        })?;
        nodes.push(node);
    }

    let mut generators = Vec::with_capacity(preset.flows.len());
    for (flow, node) in preset.flows.iter().zip(nodes) {
        let sock = world.net.create_socket(node);
        let mut generator = TrafficGenerator::new();
        generator.configure(sock, topo.sink_addr, flow.packet_size, flow.packet_budget, flow.rate)?;
        let app = world.apps.install(node, generator, flow.start, flow.stop, sim);
        info!(case = preset.case_id, host = %flow.host, node = ?node, rate = %flow.rate, "发生器已安装");
        generators.push((app, flow.host));
    }

    let trace_files = if tracing {
        enable_captures(world, topo, preset, out_dir)?
    } else {
        Vec::new()
    };

    Ok(Installed {
        case_id: Some(preset.case_id),
        generators,
        trace_files,
    })
}
