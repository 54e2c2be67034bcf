use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ScenarioError;
use super::traffic::{EnqueueData, SendTo};
use crate::aodv::{AodvConfig, AodvNode};
use crate::mac::{MacConfig, MacawNode};
use crate::net::{MoveNode, NodeId, Position, RadioWorld};
use crate::sim::{SimTime, Simulator};

/// 未指定长度时 MAC 流量的默认字节数
pub const DEFAULT_MAC_LENGTH: u32 = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub seed: u64,
    pub until_s: f64,
    pub layer: Layer,
    #[serde(default)]
    pub mac: Option<MacOverrides>,
    #[serde(default)]
    pub aodv: Option<AodvOverrides>,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub traffic: Vec<TrafficSpec>,
    #[serde(default)]
    pub moves: Vec<MoveSpec>,
}

/// 节点运行哪一层协议
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Macaw,
    Aodv,
    AodvOverMacaw,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacOverrides {
    #[serde(default)]
    pub byte_time_ms: Option<f64>,
    #[serde(default)]
    pub min_window: Option<u32>,
    #[serde(default)]
    pub max_window: Option<u32>,
    #[serde(default)]
    pub timeout_slots: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AodvOverrides {
    #[serde(default)]
    pub byte_time_ms: Option<f64>,
    #[serde(default)]
    pub rrep_delay_s: Option<f64>,
    #[serde(default)]
    pub start_delay_s: Option<f64>,
    #[serde(default)]
    pub forward_delay_s: Option<f64>,
    #[serde(default)]
    pub rediscover_delay_s: Option<f64>,
    #[serde(default)]
    pub data_interval_s: Option<f64>,
    #[serde(default)]
    pub burst_min: Option<u32>,
    #[serde(default)]
    pub burst_max: Option<u32>,
    #[serde(default)]
    pub intermediate_reply: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub x: f64,
    pub y: f64,
    pub tx_range: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficSpec {
    #[serde(default)]
    pub at_s: f64,
    pub src: usize,
    pub dst: usize,
    /// MAC 层数据长度（字节）；路由层忽略
    #[serde(default)]
    pub length: Option<u32>,
    /// MAC 层 `not_before` 偏移
    #[serde(default)]
    pub offset_s: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveSpec {
    pub at_s: f64,
    pub node: usize,
    pub x: f64,
    pub y: f64,
}

fn check_secs(field: &'static str, value: f64) -> Result<(), ScenarioError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScenarioError::BadTime { field, value })
    }
}

fn secs(value: f64) -> SimTime {
    SimTime::from_secs_f64(value)
}

impl ScenarioSpec {
    pub fn from_json_str(raw: &str) -> Result<Self, ScenarioError> {
        let spec: ScenarioSpec = serde_json::from_str(raw)?;
        spec.validate()?;
        Ok(spec)
    }

    /// 读取并校验场景文件
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ScenarioError::io(path, e))?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.nodes.is_empty() {
            return Err(ScenarioError::NoNodes);
        }
        check_secs("until_s", self.until_s)?;
        let count = self.nodes.len();
        for (node, n) in self.nodes.iter().enumerate() {
            if !n.tx_range.is_finite() || n.tx_range <= 0.0 {
                return Err(ScenarioError::BadRange {
                    node,
                    tx_range: n.tx_range,
                });
            }
        }
        let known = |context: &'static str, node: usize| {
            if node < count {
                Ok(())
            } else {
                Err(ScenarioError::UnknownNode {
                    context,
                    node,
                    count,
                })
            }
        };
        for (index, t) in self.traffic.iter().enumerate() {
            known("traffic.src", t.src)?;
            known("traffic.dst", t.dst)?;
            if t.src == t.dst {
                return Err(ScenarioError::SelfTraffic { index, node: t.src });
            }
            check_secs("traffic.at_s", t.at_s)?;
            if let Some(offset) = t.offset_s {
                check_secs("traffic.offset_s", offset)?;
            }
        }
        for m in &self.moves {
            known("moves.node", m.node)?;
            check_secs("moves.at_s", m.at_s)?;
        }
        Ok(())
    }

    pub fn until(&self) -> SimTime {
        secs(self.until_s)
    }

    /// 默认 MAC 配置叠加场景中的覆盖项
    pub fn mac_config(&self) -> MacConfig {
        let mut cfg = MacConfig::default();
        if let Some(o) = &self.mac {
            if let Some(ms) = o.byte_time_ms {
                cfg.byte_time = secs(ms / 1000.0);
            }
            if let Some(w) = o.min_window {
                cfg.min_window = w.max(1);
            }
            if let Some(w) = o.max_window {
                cfg.max_window = w;
            }
            if let Some(slots) = o.timeout_slots {
                cfg.timeout_slots = slots;
            }
        }
        cfg.max_window = cfg.max_window.max(cfg.min_window);
        cfg
    }

    /// 默认路由配置叠加场景中的覆盖项
    pub fn aodv_config(&self) -> AodvConfig {
        let mut cfg = AodvConfig::default();
        if let Some(o) = &self.aodv {
            if let Some(ms) = o.byte_time_ms {
                cfg.byte_time = secs(ms / 1000.0);
            }
            if let Some(s) = o.rrep_delay_s {
                cfg.rrep_delay = secs(s);
            }
            if let Some(s) = o.start_delay_s {
                cfg.start_delay = secs(s);
            }
            if let Some(s) = o.forward_delay_s {
                cfg.forward_delay = secs(s);
            }
            if let Some(s) = o.rediscover_delay_s {
                cfg.rediscover_delay = secs(s);
            }
            if let Some(s) = o.data_interval_s {
                cfg.data_interval = secs(s);
            }
            if let Some(n) = o.burst_min {
                cfg.burst_min = n;
            }
            if let Some(n) = o.burst_max {
                cfg.burst_max = n;
            }
            if let Some(on) = o.intermediate_reply {
                cfg.intermediate_reply = on;
            }
        }
        // 每次传输至少一帧
        cfg.burst_min = cfg.burst_min.max(1);
        cfg.burst_max = cfg.burst_max.max(cfg.burst_min);
        cfg
    }

    /// 构建仿真器与无线世界，并调度全部流量与移动事件
    pub fn build(&self) -> Result<(Simulator, RadioWorld), ScenarioError> {
        self.validate()?;
        let mut world = RadioWorld::with_seed(self.seed);
        let mac = self.mac_config();
        let aodv = self.aodv_config();

        for n in &self.nodes {
            let pos = Position::new(n.x, n.y);
            match self.layer {
                Layer::Macaw => world.medium.add_node(pos, n.tx_range, |id| {
                    Box::new(MacawNode::new(id, mac.clone()))
                }),
                Layer::Aodv => world.medium.add_node(pos, n.tx_range, |id| {
                    Box::new(AodvNode::new(id, aodv.clone()))
                }),
                Layer::AodvOverMacaw => world.medium.add_node(pos, n.tx_range, |id| {
                    Box::new(AodvNode::with_mac(id, aodv.clone(), mac.clone()))
                }),
            };
        }

        let mut sim = Simulator::default();
        for t in &self.traffic {
            let (node, destination) = (NodeId(t.src), NodeId(t.dst));
            match self.layer {
                Layer::Macaw => sim.schedule(
                    secs(t.at_s),
                    EnqueueData {
                        node,
                        length: t.length.unwrap_or(DEFAULT_MAC_LENGTH),
                        destination,
                        offset: t.offset_s.map(secs).unwrap_or(SimTime::ZERO),
                    },
                ),
                Layer::Aodv | Layer::AodvOverMacaw => {
                    sim.schedule(secs(t.at_s), SendTo { node, destination })
                }
            }
        }
        for m in &self.moves {
            sim.schedule(
                secs(m.at_s),
                MoveNode {
                    node: NodeId(m.node),
                    to: Position::new(m.x, m.y),
                },
            );
        }

        info!(
            nodes = self.nodes.len(),
            traffic = self.traffic.len(),
            moves = self.moves.len(),
            layer = ?self.layer,
            "场景已构建"
        );
        Ok((sim, world))
    }
}
