//! MACAW 演示：直线 / 延长直线 / 基站拓扑

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use wsnsim_rs::mac::{MacConfig, MacawNode};
use wsnsim_rs::net::{Medium, NodeId, Position, RadioWorld};
use wsnsim_rs::scenario::ScenarioError;
use wsnsim_rs::sim::{SimTime, Simulator};
use wsnsim_rs::topo::{LineOpts, StarOpts, build_line, build_star};
use wsnsim_rs::trace::TraceLog;
use tracing::info;

const PACKET_BYTES: u32 = 256;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Layout {
    /// 三个节点：n1 向 n2 发 4 个包，n0 稍后向 n1 发 1 个
    Line,
    /// 四个节点：n1 -> n0 与 n2 -> n3 同时进行（暴露终端）
    ExtendedLine,
    /// 基站在中间，两侧节点同时向它发送
    BaseStation,
}

#[derive(Debug, Parser)]
#[command(name = "macaw-line", about = "MACAW 握手演示（直线/基站拓扑）")]
struct Args {
    #[arg(long, value_enum, default_value_t = Layout::Line)]
    layout: Layout,
    #[arg(long, default_value_t = 60.0)]
    until_s: f64,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// MACAW 字节时间（毫秒）
    #[arg(long, default_value_t = 20)]
    byte_time_ms: u64,
    /// 输出追踪事件 JSON
    #[arg(long)]
    trace_json: Option<PathBuf>,
}

fn enqueue(medium: &mut Medium, sim: &mut Simulator, src: NodeId, dst: NodeId, n: usize, offset: SimTime) {
    for _ in 0..n {
        medium.enqueue_data(src, PACKET_BYTES, dst, offset, sim);
    }
}

fn main() -> Result<(), ScenarioError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    let cfg = MacConfig {
        byte_time: SimTime::from_millis(args.byte_time_ms),
        ..MacConfig::default()
    };
    let mut sim = Simulator::default();
    let mut world = RadioWorld::with_seed(args.seed);
    if args.trace_json.is_some() {
        world.medium.trace = Some(TraceLog::default());
    }
    let make = |id| -> Box<dyn wsnsim_rs::net::Node> { Box::new(MacawNode::new(id, cfg.clone())) };

    match args.layout {
        Layout::Line => {
            let opts = LineOpts {
                count: 3,
                origin: Position::new(225.0, 200.0),
                ..LineOpts::default()
            };
            let nodes = build_line(&mut world, &opts, make);
            enqueue(&mut world.medium, &mut sim, nodes[1], nodes[2], 4, SimTime::ZERO);
            enqueue(&mut world.medium, &mut sim, nodes[0], nodes[1], 1, SimTime::from_secs(1));
        }
        Layout::ExtendedLine => {
            let nodes = build_line(&mut world, &LineOpts::default(), make);
            enqueue(&mut world.medium, &mut sim, nodes[1], nodes[0], 1, SimTime::ZERO);
            enqueue(&mut world.medium, &mut sim, nodes[2], nodes[3], 1, SimTime::ZERO);
        }
        Layout::BaseStation => {
            let topo = build_star(&mut world, &StarOpts::default(), make);
            enqueue(&mut world.medium, &mut sim, topo.leaves[0], topo.hub, 5, SimTime::ZERO);
            enqueue(&mut world.medium, &mut sim, topo.leaves[1], topo.hub, 1, SimTime::from_secs(1));
        }
    }

    info!(layout = ?args.layout, nodes = world.medium.len(), "🚀 开始仿真");
    sim.run_until(SimTime::from_secs_f64(args.until_s), &mut world);

    if let Some(path) = args.trace_json {
        if let Some(t) = world.medium.trace.take() {
            let json = t.to_json_pretty()?;
            fs::write(&path, json).map_err(|e| ScenarioError::io(&path, e))?;
            eprintln!("wrote trace events to {}", path.display());
        }
    }

    let backoffs: u64 = world
        .medium
        .node_ids()
        .filter_map(|id| world.medium.mac(id))
        .map(|m| m.stats().backoffs)
        .sum();
    let queued: usize = world
        .medium
        .node_ids()
        .filter_map(|id| world.medium.mac(id))
        .map(|m| m.queue_len())
        .sum();
    println!(
        "done @ {}, delivered={}, delivered_bytes={}, collisions={}, backoffs={}, still_queued={}",
        sim.now(),
        world.medium.stats.delivered_payloads,
        world.medium.stats.delivered_bytes,
        world.medium.stats.collisions,
        backoffs,
        queued
    );
    Ok(())
}
