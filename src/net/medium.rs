//! 无线介质
//!
//! 共享广播信道：持有全部节点、位置与发射半径，按发送方半径计算邻居集合，
//! 并以 `DeliverFrame` 事件把帧交付给范围内的节点。除非显式建模，不丢帧。

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::deliver_frame::DeliverFrame;
use super::frame::Frame;
use super::id::{NodeId, Position};
use super::node::Node;
use super::node_timer::{NodeTimer, Timer};
use super::stats::Stats;
use crate::aodv::AodvNode;
use crate::mac::MacawNode;
use crate::sim::{SimTime, Simulator};
use crate::trace::{TraceEvent, TraceKind, TraceLog};
use tracing::{debug, trace, warn};

/// 节点的无线参数
#[derive(Debug, Clone, Copy)]
struct Radio {
    pos: Position,
    tx_range: f64,
}

/// 无线介质
pub struct Medium {
    nodes: Vec<Option<Box<dyn Node>>>,
    radios: Vec<Radio>,
    propagation: SimTime,
    rng: StdRng,
    pub stats: Stats,
    pub trace: Option<TraceLog>,
}

impl Default for Medium {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Medium {
    /// 以给定随机种子创建介质；所有节点共享这一个随机源。
    pub fn with_seed(seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            radios: Vec::new(),
            propagation: SimTime::ZERO,
            rng: StdRng::seed_from_u64(seed),
            stats: Stats::default(),
            trace: None,
        }
    }

    /// 设置传播时延（默认 0：T 时刻广播的帧在 T 时刻到达）
    pub fn set_propagation_delay(&mut self, delay: SimTime) {
        self.propagation = delay;
    }

    /// 添加节点；`make` 根据分配到的 id 构造节点
    pub fn add_node<F>(&mut self, pos: Position, tx_range: f64, make: F) -> NodeId
    where
        F: FnOnce(NodeId) -> Box<dyn Node>,
    {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(make(id)));
        self.radios.push(Radio { pos, tx_range });
        self.stats.record_rx_slot(id);
        debug!(node = %id, x = pos.x, y = pos.y, tx_range, "添加节点");
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn position(&self, id: NodeId) -> Option<Position> {
        self.radios.get(id.0).map(|r| r.pos)
    }

    pub fn tx_range(&self, id: NodeId) -> Option<f64> {
        self.radios.get(id.0).map(|r| r.tx_range)
    }

    /// 移动节点（离散的 "node moved" 事件）
    pub fn move_node(&mut self, id: NodeId, to: Position, now: SimTime) {
        let Some(r) = self.radios.get_mut(id.0) else {
            warn!(node = %id, "移动未知节点");
            return;
        };
        r.pos = to;
        debug!(node = %id, x = to.x, y = to.y, "📍 节点移动");
        self.record(id, now, TraceKind::Moved { x: to.x, y: to.y });
    }

    /// 当前位于 `id` 发射半径内的其他节点（按 id 升序）
    pub fn neighbors_of(&self, id: NodeId) -> Vec<NodeId> {
        let Some(me) = self.radios.get(id.0) else {
            return Vec::new();
        };
        self.radios
            .iter()
            .enumerate()
            .filter(|(j, r)| *j != id.0 && me.pos.distance(&r.pos) <= me.tx_range)
            .map(|(j, _)| NodeId(j))
            .collect()
    }

    /// `to` 是否在 `from` 的发射范围内
    pub fn is_neighbor(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return false;
        }
        match (self.radios.get(from.0), self.radios.get(to.0)) {
            (Some(a), Some(b)) => a.pos.distance(&b.pos) <= a.tx_range,
            _ => false,
        }
    }

    /// 共享随机源
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// 只读访问节点
    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(id.0).and_then(|n| n.as_deref())
    }

    pub fn mac(&self, id: NodeId) -> Option<&MacawNode> {
        self.node(id).and_then(|n| n.mac())
    }

    pub fn router(&self, id: NodeId) -> Option<&AodvNode> {
        self.node(id).and_then(|n| n.router())
    }

    /// 广播：范围内每个邻居都会收到一份
    #[tracing::instrument(level = "trace", skip(self, frame, sim), fields(kind = ?frame.kind()))]
    pub fn broadcast(&mut self, from: NodeId, frame: Frame, sim: &mut Simulator) {
        self.record_tx(from, frame.target(), &frame, sim.now());

        let at = sim.now().saturating_add(self.propagation);
        let neighbors = self.neighbors_of(from);
        trace!(neighbors = neighbors.len(), "📡 广播");
        for to in neighbors {
            sim.schedule(
                at,
                DeliverFrame {
                    to,
                    from,
                    frame: frame.clone(),
                },
            );
        }
    }

    /// 单播：只有 `to` 在范围内时才会被交付
    #[tracing::instrument(level = "trace", skip(self, frame, sim), fields(kind = ?frame.kind()))]
    pub fn unicast(&mut self, from: NodeId, to: NodeId, frame: Frame, sim: &mut Simulator) {
        self.record_tx(from, Some(to), &frame, sim.now());
        if !self.is_neighbor(from, to) {
            warn!(%from, %to, "单播目标不在范围内，帧丢失");
            self.stats.dropped_unicasts += 1;
            return;
        }
        let at = sim.now().saturating_add(self.propagation);
        sim.schedule(at, DeliverFrame { to, from, frame });
    }

    /// 在 `delay` 后触发节点定时器
    pub fn schedule_timer(&mut self, node: NodeId, delay: SimTime, timer: Timer, sim: &mut Simulator) {
        sim.schedule_in(delay, NodeTimer { node, timer });
    }

    /// 将帧交付给节点处理
    pub fn deliver(&mut self, to: NodeId, from: NodeId, frame: Frame, sim: &mut Simulator) {
        self.stats.record_rx(to);
        // 暂时把节点取出来，避免 &mut self 与 &mut node 的重叠借用。
        let Some(mut node) = self.nodes.get_mut(to.0).and_then(Option::take) else {
            warn!(%to, "节点不存在或正在处理中");
            return;
        };
        node.on_frame(from, frame, sim, self);
        self.nodes[to.0] = Some(node);
    }

    /// 触发节点定时器
    pub fn fire_timer(&mut self, id: NodeId, timer: Timer, sim: &mut Simulator) {
        let Some(mut node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            warn!(node = %id, "节点不存在或正在处理中");
            return;
        };
        node.on_timer(timer, sim, self);
        self.nodes[id.0] = Some(node);
    }

    /// 取出节点并在其上执行 `f`（外部脚本的入口）
    pub fn with_node<F, R>(&mut self, id: NodeId, sim: &mut Simulator, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn Node, &mut Simulator, &mut Medium) -> R,
    {
        let mut node = self.nodes.get_mut(id.0).and_then(Option::take)?;
        let result = f(node.as_mut(), sim, self);
        self.nodes[id.0] = Some(node);
        Some(result)
    }

    /// MAC 层入口：为 `destination` 排队 `length` 字节
    pub fn enqueue_data(
        &mut self,
        node: NodeId,
        length: u32,
        destination: NodeId,
        offset: SimTime,
        sim: &mut Simulator,
    ) -> bool {
        self.with_node(node, sim, |n, sim, medium| match n.mac_mut() {
            Some(mac) => {
                mac.enqueue(length, destination, offset, sim, medium);
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    /// 路由层入口：向 `destination` 发送一次数据突发
    pub fn send_to(&mut self, node: NodeId, destination: NodeId, sim: &mut Simulator) -> bool {
        self.with_node(node, sim, |n, sim, medium| match n.router_mut() {
            Some(router) => {
                router.send_to(destination, sim, medium);
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    /// 记录追踪事件（未开启追踪时为空操作）
    pub fn record(&mut self, node: NodeId, now: SimTime, kind: TraceKind) {
        if let Some(t) = &mut self.trace {
            t.push(TraceEvent {
                t_ns: now.0,
                node: node.0,
                kind,
            });
        }
    }

    fn record_tx(&mut self, from: NodeId, target: Option<NodeId>, frame: &Frame, now: SimTime) {
        let kind = frame.kind();
        self.stats.record_tx(kind);
        let length = frame.length();
        self.record(
            from,
            now,
            TraceKind::Tx {
                frame: kind,
                target: target.map(|t| t.0),
                length,
            },
        );
    }
}
