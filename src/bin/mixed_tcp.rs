//! 混合拓扑 TCP 实验
//!
//! p2p + CSMA + Wi-Fi 拓扑上运行 1/2/5/7 个限速发生器，全部发往 n1 上的 sink，
//! 并按场景开启 pcap 与文本 trace。

use clap::{ArgAction, Parser};
use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tcpmix_rs::net::{DataRate, NetWorld};
use tcpmix_rs::scenario::{self, RunSummary, ScenarioTable};
use tcpmix_rs::sim::{SimTime, Simulator};
use tcpmix_rs::topo::{MixedOpts, build_mixed};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "mixed-tcp",
    about = "混合拓扑仿真：p2p + CSMA + Wi-Fi 上的限速 TCP 发生器"
)]
struct Args {
    /// CSMA 总线上除 n0 之外的节点数
    #[arg(long = "n-csma", alias = "nCsma", default_value_t = 2)]
    n_csma: u32,

    /// Wi-Fi 站点数
    #[arg(long = "n-wifi", alias = "nWifi", default_value_t = 5)]
    n_wifi: u32,

    /// true 时默认日志级别为 info，否则为 warn（RUST_LOG 优先）
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    verbose: bool,

    /// 开启 pcap 与文本 trace
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    tracing: bool,

    /// 场景编号；不填则从标准输入读取
    #[arg(long)]
    case: Option<u32>,

    /// trace 文件输出目录
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// p2p 链路速率（如 `5Mbps`）
    #[arg(long, default_value = "5Mbps")]
    p2p_rate: DataRate,

    /// CSMA 总线速率
    #[arg(long, default_value = "100Mbps")]
    csma_rate: DataRate,

    /// Wi-Fi 信道速率
    #[arg(long, default_value = "54Mbps")]
    wifi_rate: DataRate,

    /// 误码模型随机种子
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// 仿真运行到多少毫秒；不填则运行到流的停止时刻
    #[arg(long)]
    until_ms: Option<u64>,

    /// 输出 JSON 格式的运行汇总
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

/// 读一行场景编号；无法解析的输入视为未知场景
fn prompt_case() -> io::Result<Option<u32>> {
    let mut stdout = io::stdout();
    write!(stdout, "Enter simulation case - 1 or 2 or 3 or 4: ")?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().parse().ok())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let case = match args.case {
        Some(c) => Some(c),
        None => prompt_case()?,
    };

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    world.net.seed(args.seed);

    let opts = MixedOpts {
        n_csma: args.n_csma,
        n_wifi: args.n_wifi,
        p2p_rate: args.p2p_rate,
        csma_rate: args.csma_rate,
        wifi_rate: args.wifi_rate,
        ..MixedOpts::default()
    };
    let topo = build_mixed(&mut world, &opts)?;

    if args.tracing {
        fs::create_dir_all(&args.out_dir)?;
    }

    let sink = scenario::install_sink(&mut world, &mut sim, &topo, opts.sim_time);
    let table = ScenarioTable::standard();
    let preset = case.and_then(|c| table.lookup(c));
    if preset.is_none() {
        info!(?case, "没有匹配的场景预设，不安装发生器，仿真空跑到停止时刻");
    }
    let installed = scenario::install(&mut world, &mut sim, &topo, preset, &args.out_dir, args.tracing)?;

    let stop = args.until_ms.map_or(opts.sim_time, SimTime::from_millis);
    sim.stop_at(stop);
    sim.run(&mut world);
    let released = sim.teardown();
    info!(released, "仿真器已销毁");

    world.net.finish_traces()?;

    let summary = RunSummary::collect(&world, &sim, &installed, sink);
    println!(
        "done @ {}\n  case: {:?}, generators={}, sent_units={}, sink_rx_bytes={}\n  net: delivered_pkts={}, delivered_bytes={}, dropped_pkts={}, corrupted_pkts={}, no_route_pkts={}\n  trace: files={}, pcap_records={}, ascii_lines={}",
        sim.now(),
        summary.case_id,
        summary.generators.len(),
        summary.total_sent(),
        summary.sink_rx_bytes,
        summary.net.delivered_pkts,
        summary.net.delivered_bytes,
        summary.net.dropped_pkts,
        summary.net.corrupted_pkts,
        summary.net.no_route_pkts,
        summary.trace_files.len(),
        summary.pcap_records,
        summary.ascii_lines,
    );
    for g in &summary.generators {
        println!(
            "  flow app={} host={} node=n{} rate_bps={} sent={} send_failures={} acked_bytes={}",
            g.app, g.host, g.node, g.rate_bps, g.sent, g.send_failures, g.acked_bytes
        );
    }

    if let Some(path) = args.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(&path, json)?;
        eprintln!("wrote summary to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
