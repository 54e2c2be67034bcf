//! 动态 AODV 演示：7×7 扰动网格，中途切断一条在用的路径

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use wsnsim_rs::aodv::{AodvConfig, AodvNode};
use wsnsim_rs::mac::MacConfig;
use wsnsim_rs::net::{MoveNode, Node, NodeId, Position, RadioWorld};
use wsnsim_rs::scenario::{ScenarioError, SendTo};
use wsnsim_rs::sim::{SimTime, Simulator};
use wsnsim_rs::topo::{GridOpts, build_grid};
use wsnsim_rs::trace::TraceLog;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "aodv-grid", about = "AODV 路由发现与断链恢复演示（7×7 网格）")]
struct Args {
    #[arg(long, default_value_t = 150.0)]
    until_s: f64,
    #[arg(long, default_value_t = 7)]
    cols: usize,
    #[arg(long, default_value_t = 7)]
    rows: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// 源节点（默认 1）
    #[arg(long, default_value_t = 1)]
    src: usize,
    /// 目的节点（默认最后一个）
    #[arg(long)]
    dst: Option<usize>,
    /// 在此时刻把源节点路由上的第一跳移出范围（秒）；不指定则不切断
    #[arg(long)]
    break_at_s: Option<f64>,
    /// 单播经 MACAW 握手发送
    #[arg(long)]
    over_macaw: bool,
    /// 打印源节点最终的路由表
    #[arg(long)]
    print_table: bool,
    #[arg(long)]
    trace_json: Option<PathBuf>,
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
    let mut sim = Simulator::default();
    let mut world = RadioWorld::with_seed(args.seed);
    if args.trace_json.is_some() {
        world.medium.trace = Some(TraceLog::default());
    }

    let opts = GridOpts {
        cols: args.cols,
        rows: args.rows,
        ..GridOpts::default()
    };
    let cfg = AodvConfig::default();
    let over_macaw = args.over_macaw;
    let topo = build_grid(&mut world, &opts, |id| -> Box<dyn Node> {
        if over_macaw {
            Box::new(AodvNode::with_mac(id, cfg.clone(), MacConfig::default()))
        } else {
            Box::new(AodvNode::new(id, cfg.clone()))
        }
    });
    let count = topo.nodes.len();
    let src = NodeId(args.src.min(count.saturating_sub(1)));
    let dst = NodeId(args.dst.unwrap_or(count.saturating_sub(1)).min(count.saturating_sub(1)));
    sim.schedule(SimTime::ZERO, SendTo { node: src, destination: dst });

    let until = SimTime::from_secs_f64(args.until_s);
    if let Some(at) = args.break_at_s {
        let at = SimTime::from_secs_f64(at);
        sim.run_until(at, &mut world);
        // 切断路径：把当前路由上的下一跳（若不是目的地）移到场外
        let victim = world
            .medium
            .router(src)
            .and_then(|r| r.table().get(dst))
            .map(|row| row.next)
            .filter(|next| *next != dst && *next != src);
        if let Some(victim) = victim {
            info!(%victim, "✂️ 移走路径上的节点");
            sim.schedule(
                at,
                MoveNode {
                    node: victim,
                    to: Position::new(-1000.0, -1000.0),
                },
            );
            sim.schedule(at, SendTo { node: src, destination: dst });
        }
    }
    sim.run_until(until, &mut world);

    if let Some(path) = args.trace_json {
        if let Some(t) = world.medium.trace.take() {
            let json = t.to_json_pretty()?;
            fs::write(&path, json).map_err(|e| ScenarioError::io(&path, e))?;
            eprintln!("wrote trace events to {}", path.display());
        }
    }

    if let Some(router) = world.medium.router(src) {
        if args.print_table {
            print!("{}", router.table().render());
        }
    }
    let received = world
        .medium
        .router(dst)
        .map(|r| r.stats().data_received)
        .unwrap_or(0);
    let (rreq, rerr): (u64, u64) = world
        .medium
        .node_ids()
        .filter_map(|id| world.medium.router(id))
        .fold((0, 0), |(q, e), r| (q + r.stats().rreq_sent, e + r.stats().rerr_originated));
    let route = world
        .medium
        .router(src)
        .and_then(|r| r.table().get(dst).copied());
    println!(
        "done @ {}, src={}, dst={}, data_received={}, rreq_originated={}, rerr_originated={}, route={:?}",
        sim.now(),
        src,
        dst,
        received,
        rreq,
        rerr,
        route
    );
    Ok(())
}
