//! AODV 节点
//!
//! 每条到达的路由消息只在一个调度点上做一次"准入 + 决策"；之后的延迟
//! （中继抖动、目的地回复延迟、转发延迟）都表示为定时器。数据传输是一个
//! 独立的可取消进程，由 `DataTick` 定时器驱动。

use std::collections::BTreeSet;

use rand::Rng;

use super::config::AodvConfig;
use super::table::RoutingTable;
use super::transfer::Transfer;
use crate::mac::{MacConfig, MacIndication, MacTimer, MacawNode};
use crate::net::{Frame, Medium, Node, NodeId, RouteKind, RouteMsg, Timer};
use crate::sim::{SimTime, Simulator};
use crate::trace::TraceKind;
use tracing::{debug, info, trace, warn};

/// 路由层定时器
#[derive(Debug, Clone)]
pub enum RouteTimer {
    /// 路由帧接收完毕（已计入逐字节接收延迟）
    Process { from: NodeId, msg: RouteMsg },
    /// 抖动结束，转播 RREQ
    Rebroadcast { msg: RouteMsg },
    /// 目的地回复 RREP
    Reply { msg: RouteMsg },
    /// 沿路由表转发 RREP / RERR / DATA
    Forward { msg: RouteMsg },
    /// 收到 RREP 后开始数据传输
    StartTransfer { dest: NodeId },
    /// 数据传输进程的下一帧
    DataTick { transfer: u64 },
    /// 收到 RERR 后重新发现路由
    Rediscover { dest: NodeId },
}

/// 路由帧走哪条链路
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// 单播直接交给介质
    Direct,
    /// 单播经 MACAW 握手发送，广播仍直接上介质
    Macaw,
}

#[derive(Debug, Default, Clone)]
pub struct AodvStats {
    pub rreq_sent: u64,
    pub rrep_sent: u64,
    /// 本节点作为检测方发出的 RERR
    pub rerr_originated: u64,
    /// 未通过准入规则而丢弃的 RREQ/RREP
    pub stale_dropped: u64,
    /// 目的地已被 RERR 宣告失效而丢弃的在途 DATA
    pub data_dropped: u64,
    pub routes_found: u64,
    pub data_sent: u64,
    pub data_received: u64,
    pub transfers_completed: u64,
    pub transfers_cancelled: u64,
}

/// AODV 节点
#[derive(Debug)]
pub struct AodvNode {
    id: NodeId,
    cfg: AodvConfig,
    seq: u32,
    table: RoutingTable,
    /// 经 RERR 或断链检测而失效、尚未重新学到的目的地
    invalidated: BTreeSet<NodeId>,
    /// 正在发现路由的目的地
    awaiting_route: Option<NodeId>,
    transfer: Option<Transfer>,
    history: Vec<Transfer>,
    next_transfer: u64,
    mac: Option<MacawNode>,
    received: Vec<RouteMsg>,
    stats: AodvStats,
}

impl AodvNode {
    pub fn new(id: NodeId, cfg: AodvConfig) -> Self {
        Self {
            id,
            cfg,
            seq: 1,
            table: RoutingTable::new(id),
            invalidated: BTreeSet::new(),
            awaiting_route: None,
            transfer: None,
            history: Vec::new(),
            next_transfer: 0,
            mac: None,
            received: Vec::new(),
            stats: AodvStats::default(),
        }
    }

    /// 单播经内嵌的 MACAW 实例发送
    pub fn with_mac(id: NodeId, cfg: AodvConfig, mac: MacConfig) -> Self {
        Self {
            mac: Some(MacawNode::new(id, mac)),
            ..Self::new(id, cfg)
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn config(&self) -> &AodvConfig {
        &self.cfg
    }

    pub fn link_mode(&self) -> LinkMode {
        if self.mac.is_some() {
            LinkMode::Macaw
        } else {
            LinkMode::Direct
        }
    }

    /// 当前序列号
    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// 当前（或最近一次）数据传输
    pub fn transfer(&self) -> Option<&Transfer> {
        self.transfer.as_ref()
    }

    /// 已结束（完成或取消）的传输
    pub fn history(&self) -> &[Transfer] {
        &self.history
    }

    /// 作为目的地收到的 DATA
    pub fn received(&self) -> &[RouteMsg] {
        &self.received
    }

    pub fn stats(&self) -> &AodvStats {
        &self.stats
    }

    pub fn mac(&self) -> Option<&MacawNode> {
        self.mac.as_ref()
    }

    /// 向 `dest` 发送一次数据突发：已有路由则直接开始传输，否则先发现路由。
    #[tracing::instrument(level = "debug", skip(self, sim, medium), fields(node = %self.id))]
    pub fn send_to(&mut self, dest: NodeId, sim: &mut Simulator, medium: &mut Medium) {
        if dest == self.id {
            warn!("不能向自己发送");
            return;
        }
        if self.table.contains(dest) {
            info!(%dest, "已有路由，直接开始传输");
            self.start_transfer(dest, sim, medium);
            return;
        }
        info!(%dest, seq = self.seq, "🔍 发起路由发现");
        self.awaiting_route = Some(dest);
        self.send_rreq(dest, sim, medium);
    }

    fn send_rreq(&mut self, dest: NodeId, sim: &mut Simulator, medium: &mut Medium) {
        let msg = RouteMsg::new(RouteKind::Rreq, self.id, self.seq, dest, self.cfg.rreq_bytes);
        self.stats.rreq_sent += 1;
        self.broadcast(msg.hop(), sim, medium);
    }

    fn arm(&mut self, delay: SimTime, timer: RouteTimer, sim: &mut Simulator, medium: &mut Medium) {
        medium.schedule_timer(self.id, delay, Timer::Route(timer), sim);
    }

    fn broadcast(&mut self, msg: RouteMsg, sim: &mut Simulator, medium: &mut Medium) {
        trace!(node = %self.id, kind = ?msg.frame_kind(), hops = msg.hops, "📡 广播路由帧");
        medium.broadcast(self.id, Frame::Route(msg), sim);
    }

    fn unicast(&mut self, next: NodeId, msg: RouteMsg, sim: &mut Simulator, medium: &mut Medium) {
        trace!(node = %self.id, %next, kind = ?msg.frame_kind(), "单播路由帧");
        match &mut self.mac {
            Some(mac) => mac.enqueue_payload(msg, next, sim, medium),
            None => medium.unicast(self.id, next, Frame::Route(msg), sim),
        }
    }

    /// 以 (源, 上一跳, 序列号, 跳数) 为候选行尝试准入
    fn admit(&mut self, from: NodeId, msg: &RouteMsg, now: SimTime, medium: &mut Medium) -> bool {
        if !self.table.admit(msg.src, from, msg.seq, msg.hops) {
            trace!(node = %self.id, src = %msg.src, seq = msg.seq, hops = msg.hops, "过期或重复，丢弃");
            self.stats.stale_dropped += 1;
            return false;
        }
        debug!(node = %self.id, dest = %msg.src, next = %from, seq = msg.seq, hops = msg.hops, "更新路由");
        self.invalidated.remove(&msg.src);
        medium.record(
            self.id,
            now,
            TraceKind::RouteUpdate {
                dest: msg.src.0,
                next: from.0,
                seq: msg.seq,
                hops: msg.hops,
            },
        );
        true
    }

    fn remove_route(&mut self, dest: NodeId, now: SimTime, medium: &mut Medium) -> bool {
        if self.table.remove(dest).is_none() {
            return false;
        }
        debug!(node = %self.id, %dest, "删除路由");
        medium.record(self.id, now, TraceKind::RouteRemoved { dest: dest.0 });
        true
    }

    /// 收到一条完整的路由消息：准入并决定下一步
    #[tracing::instrument(level = "debug", skip(self, msg, sim, medium), fields(node = %self.id, kind = ?msg.frame_kind()))]
    fn on_route_msg(&mut self, from: NodeId, msg: RouteMsg, sim: &mut Simulator, medium: &mut Medium) {
        let now = sim.now();
        match msg.kind {
            RouteKind::Rreq => {
                if !self.admit(from, &msg, now, medium) {
                    return;
                }
                if msg.dest == self.id {
                    info!(src = %msg.src, "收到 RREQ，准备回复 RREP");
                    let delay = self.cfg.rrep_delay;
                    self.arm(delay, RouteTimer::Reply { msg }, sim, medium);
                    return;
                }
                if self.cfg.intermediate_reply {
                    if let Some(row) = self.table.get(msg.dest).copied() {
                        debug!(dest = %msg.dest, hops = row.hops, "中间节点代为回复");
                        let mut reply = RouteMsg::new(
                            RouteKind::Rrep,
                            msg.dest,
                            row.seq,
                            msg.src,
                            self.cfg.rrep_bytes,
                        );
                        reply.hops = row.hops;
                        self.stats.rrep_sent += 1;
                        let delay = self.cfg.forward_delay;
                        self.arm(delay, RouteTimer::Forward { msg: reply }, sim, medium);
                        return;
                    }
                }
                let (lo, hi) = (self.cfg.jitter_min.0, self.cfg.jitter_max.0.max(self.cfg.jitter_min.0));
                let jitter = SimTime(medium.rng().gen_range(lo..=hi));
                self.arm(jitter, RouteTimer::Rebroadcast { msg }, sim, medium);
            }
            RouteKind::Rrep => {
                if !self.admit(from, &msg, now, medium) {
                    return;
                }
                if msg.dest == self.id {
                    info!(dest = %msg.src, hops = msg.hops, "✅ 路由建立");
                    self.stats.routes_found += 1;
                    if self.awaiting_route == Some(msg.src) {
                        self.awaiting_route = None;
                        let delay = self.cfg.start_delay;
                        self.arm(delay, RouteTimer::StartTransfer { dest: msg.src }, sim, medium);
                    }
                    return;
                }
                let delay = self.cfg.forward_delay;
                self.arm(delay, RouteTimer::Forward { msg }, sim, medium);
            }
            RouteKind::Data => {
                if msg.dest == self.id {
                    info!(src = %msg.src, seq = msg.seq, "📦 收到数据");
                    self.stats.data_received += 1;
                    medium.record(
                        self.id,
                        now,
                        TraceKind::Delivered {
                            from: msg.src.0,
                            length: msg.length,
                        },
                    );
                    self.received.push(msg);
                    return;
                }
                let delay = self.cfg.forward_delay;
                self.arm(delay, RouteTimer::Forward { msg }, sim, medium);
            }
            RouteKind::Rerr { broken_dest, broken_next } => {
                if msg.dest == self.id {
                    warn!(%broken_dest, %broken_next, reporter = %msg.src, "收到 RERR");
                    self.route_broken(broken_dest, sim, medium);
                    return;
                }
                // 只有受影响的节点继续回传，避免 RERR 在断链附近来回广播
                if self.remove_route(broken_dest, now, medium) {
                    self.invalidated.insert(broken_dest);
                    let delay = self.cfg.forward_delay;
                    self.arm(delay, RouteTimer::Forward { msg }, sim, medium);
                } else {
                    trace!(%broken_dest, "RERR 与本节点无关");
                }
            }
        }
    }

    /// 按路由表把消息交给下一跳；先做存活检查
    fn forward(&mut self, msg: RouteMsg, sim: &mut Simulator, medium: &mut Medium) {
        let next = self.table.get(msg.dest).map(|row| row.next);
        let reachable = next.is_some_and(|n| medium.is_neighbor(self.id, n));
        if next.is_none() && msg.kind == RouteKind::Data && self.invalidated.contains(&msg.dest) {
            // 断链已有 RERR 回报过
            debug!(node = %self.id, dest = %msg.dest, src = %msg.src, seq = msg.seq, "🗑️ 目的地已失效，丢弃在途数据");
            self.stats.data_dropped += 1;
            return;
        }
        match next {
            Some(next) if reachable => self.unicast(next, msg.hop(), sim, medium),
            _ if msg.kind == RouteKind::Data => self.report_broken(msg, next, sim, medium),
            _ => {
                warn!(node = %self.id, dest = %msg.dest, ?next, kind = ?msg.frame_kind(), "下一跳不可达，改为广播");
                self.broadcast(msg.hop(), sim, medium);
            }
        }
    }

    /// DATA 的下一跳不可达：删除该路由并向数据源回报 RERR
    fn report_broken(&mut self, msg: RouteMsg, next: Option<NodeId>, sim: &mut Simulator, medium: &mut Medium) {
        let broken_next = next.unwrap_or(self.id);
        warn!(node = %self.id, dest = %msg.dest, %broken_next, "❌ 链路断开");
        self.remove_route(msg.dest, sim.now(), medium);
        self.invalidated.insert(msg.dest);
        if msg.src == self.id {
            self.route_broken(msg.dest, sim, medium);
            return;
        }
        self.stats.rerr_originated += 1;
        let rerr = RouteMsg::new(
            RouteKind::Rerr {
                broken_dest: msg.dest,
                broken_next,
            },
            self.id,
            0,
            msg.src,
            self.cfg.rerr_bytes,
        );
        self.forward(rerr, sim, medium);
    }

    /// 源节点得知到 `dest` 的路由失效：取消传输，稍后重新发现
    fn route_broken(&mut self, dest: NodeId, sim: &mut Simulator, medium: &mut Medium) {
        self.remove_route(dest, sim.now(), medium);
        let active = self
            .transfer
            .as_ref()
            .is_some_and(|t| t.dest == dest && t.is_in_progress());
        if active {
            self.cancel_transfer();
        }
        // 新路由建立后重新开始传输
        self.awaiting_route = Some(dest);
        let delay = self.cfg.rediscover_delay;
        self.arm(delay, RouteTimer::Rediscover { dest }, sim, medium);
    }

    fn cancel_transfer(&mut self) {
        if let Some(mut t) = self.transfer.take() {
            if t.cancel() {
                info!(node = %self.id, transfer = t.id, dest = %t.dest, sent = t.sent, "🛑 取消传输");
                self.stats.transfers_cancelled += 1;
                self.history.push(t);
            } else {
                self.transfer = Some(t);
            }
        }
    }

    fn start_transfer(&mut self, dest: NodeId, sim: &mut Simulator, medium: &mut Medium) {
        if self.transfer.as_ref().is_some_and(Transfer::is_in_progress) {
            self.cancel_transfer();
        }
        if let Some(done) = self.transfer.take() {
            self.history.push(done);
        }
        let lo = self.cfg.burst_min.max(1);
        let hi = self.cfg.burst_max.max(lo);
        let burst = medium.rng().gen_range(lo..=hi);
        let id = self.next_transfer;
        self.next_transfer += 1;
        let mut transfer = Transfer::new(id, dest, burst);
        transfer.start();
        self.transfer = Some(transfer);
        self.seq += 1;
        info!(node = %self.id, transfer = id, %dest, burst, "🚀 开始传输");
        let interval = self.cfg.data_interval;
        self.arm(interval, RouteTimer::DataTick { transfer: id }, sim, medium);
    }

    fn data_tick(&mut self, id: u64, sim: &mut Simulator, medium: &mut Medium) {
        let Some(dest) = self
            .transfer
            .as_ref()
            .filter(|t| t.id == id && t.is_in_progress())
            .map(|t| t.dest)
        else {
            return;
        };
        let msg = RouteMsg::new(RouteKind::Data, self.id, self.seq, dest, self.cfg.data_bytes);
        debug!(node = %self.id, %dest, seq = self.seq, "发送数据");
        self.seq += 1;
        self.stats.data_sent += 1;
        self.forward(msg, sim, medium);

        // 转发可能发现断链并取消了传输
        let Some(t) = self.transfer.as_mut().filter(|t| t.id == id) else {
            return;
        };
        if t.record_sent() {
            info!(node = %self.id, transfer = id, sent = t.sent, "传输完成");
            self.stats.transfers_completed += 1;
        } else if t.is_in_progress() {
            let interval = self.cfg.data_interval;
            self.arm(interval, RouteTimer::DataTick { transfer: id }, sim, medium);
        }
    }

    fn handle_timer(&mut self, timer: RouteTimer, sim: &mut Simulator, medium: &mut Medium) {
        match timer {
            RouteTimer::Process { from, msg } => self.on_route_msg(from, msg, sim, medium),
            RouteTimer::Rebroadcast { msg } => self.broadcast(msg.hop(), sim, medium),
            RouteTimer::Reply { msg } => {
                self.seq += self.cfg.dest_seq_step;
                let reply = RouteMsg::new(RouteKind::Rrep, self.id, self.seq, msg.src, self.cfg.rrep_bytes);
                info!(node = %self.id, to = %msg.src, seq = self.seq, "发送 RREP");
                self.stats.rrep_sent += 1;
                self.forward(reply, sim, medium);
            }
            RouteTimer::Forward { msg } => self.forward(msg, sim, medium),
            RouteTimer::StartTransfer { dest } => self.start_transfer(dest, sim, medium),
            RouteTimer::DataTick { transfer } => self.data_tick(transfer, sim, medium),
            RouteTimer::Rediscover { dest } => {
                self.seq += self.cfg.rediscover_seq_step;
                info!(node = %self.id, %dest, seq = self.seq, "🔁 重新发现路由");
                self.send_rreq(dest, sim, medium);
            }
        }
    }

    /// 把内嵌 MAC 收齐的 DATA 交给路由层
    fn pump_mac(&mut self, sim: &mut Simulator, medium: &mut Medium) {
        loop {
            let indications = match &mut self.mac {
                Some(mac) => mac.drain_indications(),
                None => return,
            };
            if indications.is_empty() {
                return;
            }
            for ind in indications {
                match ind {
                    MacIndication::Received {
                        from,
                        payload: Some(msg),
                        ..
                    } => self.on_route_msg(from, msg, sim, medium),
                    MacIndication::Received { from, .. } => {
                        trace!(node = %self.id, %from, "MAC 数据不含路由消息");
                    }
                    MacIndication::Sent { to, .. } => {
                        trace!(node = %self.id, %to, "MAC 已确认");
                    }
                }
            }
        }
    }

    fn handle_mac_timer(&mut self, timer: MacTimer, sim: &mut Simulator, medium: &mut Medium) {
        if let Some(mac) = &mut self.mac {
            mac.handle_timer(timer, sim, medium);
        }
    }
}

impl Node for AodvNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn on_frame(&mut self, from: NodeId, frame: Frame, sim: &mut Simulator, medium: &mut Medium) {
        match frame {
            Frame::Route(msg) => {
                let delay = self.cfg.rx_delay(msg.length);
                self.arm(delay, RouteTimer::Process { from, msg }, sim, medium);
            }
            Frame::Mac(f) => match &mut self.mac {
                Some(mac) => mac.on_mac_frame(from, f, sim, medium),
                None => trace!(node = %self.id, kind = ?f.kind(), "无 MAC，忽略"),
            },
        }
        self.pump_mac(sim, medium);
    }

    fn on_timer(&mut self, timer: Timer, sim: &mut Simulator, medium: &mut Medium) {
        match timer {
            Timer::Route(t) => self.handle_timer(t, sim, medium),
            Timer::Mac(t) => self.handle_mac_timer(t, sim, medium),
        }
        self.pump_mac(sim, medium);
    }

    fn mac(&self) -> Option<&MacawNode> {
        self.mac.as_ref()
    }

    fn mac_mut(&mut self) -> Option<&mut MacawNode> {
        self.mac.as_mut()
    }

    fn router(&self) -> Option<&AodvNode> {
        Some(self)
    }

    fn router_mut(&mut self) -> Option<&mut AodvNode> {
        Some(self)
    }
}
