//! 场景预设表
//!
//! 每个场景编号对应一组流（主机、速率、包大小、预算、启停时刻）
//! 以及一组抓包/trace 设置。表在构造后不再修改。

use std::fmt;

use serde::Serialize;

use crate::net::DataRate;
use crate::sim::SimTime;

/// 发生器数据单元大小（字节）
pub const PACKET_SIZE: u32 = 1460;
/// 每个发生器的发送预算（单元数）
pub const PACKET_BUDGET: u64 = 1_000_000;
pub const FLOW_START: SimTime = SimTime(1_000_000_000);
pub const FLOW_STOP: SimTime = SimTime(10_000_000_000);

/// 场景中引用的主机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "group", content = "index", rename_all = "snake_case")]
pub enum HostRef {
    /// CSMA 节点序号（0 为 n0）
    Csma(usize),
    /// Wi-Fi 站点序号
    WifiSta(usize),
}

impl fmt::Display for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostRef::Csma(i) => write!(f, "csma[{i}]"),
            HostRef::WifiSta(i) => write!(f, "sta[{i}]"),
        }
    }
}

/// 一个流：安装在 `host` 上、发往共享 sink 的发生器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSpec {
    pub host: HostRef,
    pub packet_size: u32,
    pub packet_budget: u64,
    pub rate: DataRate,
    pub start: SimTime,
    pub stop: SimTime,
}

/// 设备组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceGroup {
    P2p,
    Csma,
    Wifi,
}

/// pcap 目标设备
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcapTarget {
    /// 某个 CSMA 节点的 CSMA 设备
    Csma(usize),
    /// 某个站点的 Wi-Fi 设备
    WifiSta(usize),
    /// 组内全部设备
    All(DeviceGroup),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSpec {
    /// 每个设备一个 `<prefix>-<node>-<dev>.pcap`
    Pcap {
        prefix: String,
        targets: Vec<PcapTarget>,
        promiscuous: bool,
    },
    /// 组内全部设备写入同一个文本 trace 文件
    Ascii { file: String, group: DeviceGroup },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioPreset {
    pub case_id: u32,
    pub flows: Vec<FlowSpec>,
    pub captures: Vec<CaptureSpec>,
}

impl ScenarioPreset {
    fn new(case_id: u32, rate_mbps: u64, hosts: &[HostRef]) -> Self {
        let flows = hosts
            .iter()
            .map(|&host| FlowSpec {
                host,
                packet_size: PACKET_SIZE,
                packet_budget: PACKET_BUDGET,
                rate: DataRate::from_mbps(rate_mbps),
                start: FLOW_START,
                stop: FLOW_STOP,
            })
            .collect();

        let csma_targets = hosts
            .iter()
            .filter_map(|h| match h {
                HostRef::Csma(i) => Some(PcapTarget::Csma(*i)),
                HostRef::WifiSta(_) => None,
            })
            .collect();
        let sta_targets: Vec<PcapTarget> = hosts
            .iter()
            .filter_map(|h| match h {
                HostRef::WifiSta(i) => Some(PcapTarget::WifiSta(*i)),
                HostRef::Csma(_) => None,
            })
            .collect();

        let mut captures = vec![
            CaptureSpec::Pcap {
                prefix: format!("csma_case{case_id}"),
                targets: csma_targets,
                promiscuous: true,
            },
            CaptureSpec::Pcap {
                prefix: format!("p2p_case{case_id}"),
                targets: vec![PcapTarget::All(DeviceGroup::P2p)],
                promiscuous: false,
            },
        ];
        let has_wifi = !sta_targets.is_empty();
        if has_wifi {
            captures.push(CaptureSpec::Pcap {
                prefix: format!("phy_case{case_id}"),
                targets: sta_targets,
                promiscuous: true,
            });
        }
        captures.push(CaptureSpec::Ascii {
            file: format!("tcp-example_case{case_id}.tr"),
            group: DeviceGroup::P2p,
        });
        if has_wifi {
            captures.push(CaptureSpec::Ascii {
                file: format!("tcp-example_wifi_case{case_id}.tr"),
                group: DeviceGroup::Wifi,
            });
        }
        captures.push(CaptureSpec::Ascii {
            file: format!("tcp-example_csma_case{case_id}.tr"),
            group: DeviceGroup::Csma,
        });

        Self {
            case_id,
            flows,
            captures,
        }
    }

    pub fn generator_count(&self) -> usize {
        self.flows.len()
    }
}

/// 场景编号 -> 预设
#[derive(Debug, Clone)]
pub struct ScenarioTable {
    presets: Vec<ScenarioPreset>,
}

impl Default for ScenarioTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl ScenarioTable {
    /// 四个固定场景：1/2/5/7 个流，速率 100/200/500/700 Mbps
    pub fn standard() -> Self {
        use HostRef::{Csma, WifiSta};
        Self {
            presets: vec![
                ScenarioPreset::new(1, 100, &[Csma(1)]),
                ScenarioPreset::new(2, 200, &[Csma(1), Csma(2)]),
                ScenarioPreset::new(3, 500, &[Csma(1), Csma(2), WifiSta(0), WifiSta(1), WifiSta(2)]),
                ScenarioPreset::new(
                    4,
                    700,
                    &[
                        Csma(1),
                        Csma(2),
                        WifiSta(0),
                        WifiSta(1),
                        WifiSta(2),
                        WifiSta(3),
                        WifiSta(4),
                    ],
                ),
            ],
        }
    }

    pub fn new(presets: Vec<ScenarioPreset>) -> Self {
        Self { presets }
    }

    /// 未知编号返回 None（空闲运行）
    pub fn lookup(&self, case_id: u32) -> Option<&ScenarioPreset> {
        self.presets.iter().find(|p| p.case_id == case_id)
    }

    pub fn case_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.presets.iter().map(|p| p.case_id)
    }
}
