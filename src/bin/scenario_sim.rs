//! 运行 JSON 场景文件

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use wsnsim_rs::net::FrameKind;
use wsnsim_rs::scenario::{Layer, ScenarioError, ScenarioSpec};
use wsnsim_rs::trace::TraceLog;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "scenario-sim", about = "Run a scenario.json on the wireless MAC/routing simulator")]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: PathBuf,
    /// Override the scenario's `until_s`
    #[arg(long)]
    until_s: Option<f64>,
    /// Override the scenario's random seed
    #[arg(long)]
    seed: Option<u64>,
    /// Output trace events JSON
    #[arg(long)]
    trace_json: Option<PathBuf>,
    /// Print the summary as one JSON line instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct NodeSummary {
    id: usize,
    frames_received: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backoffs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_received: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    routes: Option<usize>,
}

#[derive(Debug, Serialize)]
struct Summary {
    layer: Layer,
    end_s: f64,
    delivered_payloads: u64,
    delivered_bytes: u64,
    collisions: u64,
    dropped_unicasts: u64,
    frames_sent: Vec<(FrameKind, u64)>,
    nodes: Vec<NodeSummary>,
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
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut spec = ScenarioSpec::load(&args.scenario)?;
    if let Some(until) = args.until_s {
        spec.until_s = until;
    }
    if let Some(seed) = args.seed {
        spec.seed = seed;
    }

    let (mut sim, mut world) = spec.build()?;
    if args.trace_json.is_some() {
        world.medium.trace = Some(TraceLog::default());
    }
    info!(layer = ?spec.layer, until = %spec.until(), "🚀 开始仿真");
    sim.run_until(spec.until(), &mut world);

    if let Some(path) = &args.trace_json {
        if let Some(t) = world.medium.trace.take() {
            let json = t.to_json_pretty()?;
            fs::write(path, json).map_err(|e| ScenarioError::io(path, e))?;
            eprintln!("wrote trace events to {}", path.display());
        }
    }

    let medium = &world.medium;
    let nodes = medium
        .node_ids()
        .map(|id| {
            let mac = medium.mac(id);
            let router = medium.router(id);
            NodeSummary {
                id: id.0,
                frames_received: medium.stats.received_by(id),
                queue_len: mac.map(|m| m.queue_len()),
                backoffs: mac.map(|m| m.stats().backoffs),
                data_received: router.map(|r| r.stats().data_received),
                routes: router.map(|r| r.table().len()),
            }
        })
        .collect();
    let summary = Summary {
        layer: spec.layer,
        end_s: sim.now().as_secs_f64(),
        delivered_payloads: medium.stats.delivered_payloads,
        delivered_bytes: medium.stats.delivered_bytes,
        collisions: medium.stats.collisions,
        dropped_unicasts: medium.stats.dropped_unicasts,
        frames_sent: medium.stats.frames_sent.iter().map(|(k, v)| (*k, *v)).collect(),
        nodes,
    };

    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "done @ {}, layer={:?}, delivered={}, delivered_bytes={}, collisions={}, dropped_unicasts={}, events={}",
            sim.now(),
            summary.layer,
            summary.delivered_payloads,
            summary.delivered_bytes,
            summary.collisions,
            summary.dropped_unicasts,
            sim.executed()
        );
    }
    Ok(())
}
