//! MACAW 节点状态机
//!
//! 每个节点独占一个状态寄存器、一个发送队列和一个 MILD 退避窗口。
//! 所有等待都表示为定时器；定时器携带布防时的"代数"（generation），
//! 状态每变化一次代数加一，过期的定时器触发时直接忽略。

use std::collections::BTreeMap;

use super::backoff::Backoff;
use super::config::MacConfig;
use super::queue::{QueueEntry, SendQueue};
use super::state::MacState;
use crate::net::{Frame, MacFrame, Medium, Node, NodeId, RouteMsg, Timer};
use crate::sim::{SimTime, Simulator};
use crate::trace::TraceKind;
use tracing::{debug, info, trace, warn};

/// MAC 层定时器（协作式挂起点的续体）
#[derive(Debug, Clone)]
pub enum MacTimer {
    /// 发送循环：空闲时尝试发送队首
    Poll,
    /// 帧接收完毕（已计入空中时间），开始处理其内容
    Process { from: NodeId, frame: MacFrame },
    /// 发出 RTS 后 3 个时隙内未收到 CTS
    RtsTimeout { generation: u64 },
    BackoffDone { generation: u64 },
    /// 回复 CTS 后对方未跟进
    CtsTimeout { generation: u64 },
    /// 旁听导致的静默结束
    QuietDone { generation: u64 },
    /// DS 之后发送 DATA
    SendData { generation: u64 },
    AckTimeout { generation: u64 },
    /// DATA 接收完毕
    RxDone { generation: u64 },
}

/// 交给上层的指示
#[derive(Debug, Clone, PartialEq)]
pub enum MacIndication {
    /// 完整收到一个 DATA
    Received {
        from: NodeId,
        length: u32,
        payload: Option<RouteMsg>,
    },
    /// 队首条目已被 ACK 确认
    Sent { to: NodeId, length: u32 },
}

/// 每节点 MAC 统计
#[derive(Debug, Default, Clone)]
pub struct MacStats {
    pub rts_sent: u64,
    pub cts_sent: u64,
    pub data_sent: u64,
    pub acks_sent: u64,
    pub acks_received: u64,
    pub backoffs: u64,
    pub ack_timeouts: u64,
    pub collisions: u64,
    pub rrts_sent: u64,
    /// 观察到的最大退避窗口
    pub max_window: u32,
    pub first_ack_at: Option<SimTime>,
}

/// MACAW 节点
#[derive(Debug)]
pub struct MacawNode {
    id: NodeId,
    cfg: MacConfig,
    state: MacState,
    generation: u64,
    queue: SendQueue,
    backoff: Backoff,
    /// 通过 DS 得知正忙的邻居 -> 忙到何时
    busy: BTreeMap<NodeId, SimTime>,
    /// 旁听 CTS 后必须保持静默到此时刻
    quiet_until: SimTime,
    /// 当前握手的对端
    peer: Option<NodeId>,
    /// WAIT 是否由自己发出的 RTS 引起（否则是旁听静默）
    awaiting_cts: bool,
    /// 退避过、尚未拿到 CTS 的队首仍在重试
    retrying: bool,
    rx_length: u32,
    rx_payload: Option<RouteMsg>,
    /// 锁定期间收到的 RTS 的发送方，稍后用 RRTS 唤醒
    deferred_rts: Option<NodeId>,
    poll_at: Option<SimTime>,
    data_seq: u64,
    indications: Vec<MacIndication>,
    stats: MacStats,
}

impl MacawNode {
    pub fn new(id: NodeId, cfg: MacConfig) -> Self {
        let backoff = Backoff::new(cfg.min_window, cfg.max_window);
        let stats = MacStats {
            max_window: backoff.window(),
            ..MacStats::default()
        };
        Self {
            id,
            cfg,
            state: MacState::Idle,
            generation: 0,
            queue: SendQueue::default(),
            backoff,
            busy: BTreeMap::new(),
            quiet_until: SimTime::ZERO,
            peer: None,
            awaiting_cts: false,
            retrying: false,
            rx_length: 0,
            rx_payload: None,
            deferred_rts: None,
            poll_at: None,
            data_seq: 0,
            indications: Vec::new(),
            stats,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn config(&self) -> &MacConfig {
        &self.cfg
    }

    pub fn state(&self) -> MacState {
        self.state
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// 当前退避窗口（时隙）
    pub fn window(&self) -> u32 {
        self.backoff.window()
    }

    pub fn stats(&self) -> &MacStats {
        &self.stats
    }

    /// 取走积累的上层指示
    pub fn drain_indications(&mut self) -> Vec<MacIndication> {
        std::mem::take(&mut self.indications)
    }

    /// 为 `destination` 排队 `length` 字节，`offset` 之后才可发送。
    pub fn enqueue(
        &mut self,
        length: u32,
        destination: NodeId,
        offset: SimTime,
        sim: &mut Simulator,
        medium: &mut Medium,
    ) {
        self.push_entry(length, destination, offset, None, sim, medium);
    }

    /// 排队一个承载路由消息的 DATA
    pub fn enqueue_payload(
        &mut self,
        payload: RouteMsg,
        destination: NodeId,
        sim: &mut Simulator,
        medium: &mut Medium,
    ) {
        self.push_entry(
            payload.length,
            destination,
            SimTime::ZERO,
            Some(payload),
            sim,
            medium,
        );
    }

    fn push_entry(
        &mut self,
        length: u32,
        destination: NodeId,
        offset: SimTime,
        payload: Option<RouteMsg>,
        sim: &mut Simulator,
        medium: &mut Medium,
    ) {
        let not_before = sim.now().saturating_add(offset);
        debug!(node = %self.id, length, %destination, %not_before, "📥 入队");
        self.queue.push(QueueEntry {
            length,
            destination,
            not_before,
            payload,
        });
        // 不立即发送：发送循环在下一个调度点恢复
        self.schedule_poll(sim.now(), sim, medium);
    }

    /// 帧到达（空中时间尚未计入）
    #[tracing::instrument(level = "debug", skip(self, frame, sim, medium), fields(node = %self.id, state = ?self.state, kind = ?frame.kind()))]
    pub fn on_mac_frame(
        &mut self,
        from: NodeId,
        frame: MacFrame,
        sim: &mut Simulator,
        medium: &mut Medium,
    ) {
        let now = sim.now();

        // 冲突检测：仅作诊断信号，不重试也不重新同步
        if self.state == MacState::Receiving {
            let expected = matches!(frame, MacFrame::Data { .. } | MacFrame::Ack { .. })
                && frame.target() == self.id;
            if !expected {
                warn!(%from, kind = ?frame.kind(), "💥 Collision");
                self.stats.collisions += 1;
                medium.stats.collisions += 1;
                medium.record(
                    self.id,
                    now,
                    TraceKind::Collision {
                        frame: frame.kind(),
                        sender: from.0,
                    },
                );
            }
        }

        if let MacFrame::Data {
            target,
            length,
            payload,
            ..
        } = frame
        {
            if target == self.id {
                self.begin_receive(from, length, payload, sim, medium);
            } else {
                trace!(%from, %target, "旁听到 DATA");
            }
            return;
        }

        let delay = self.cfg.airtime(self.cfg.frame_bytes(&frame));
        medium.schedule_timer(
            self.id,
            delay,
            Timer::Mac(MacTimer::Process { from, frame }),
            sim,
        );
    }

    /// 处理 MAC 定时器
    pub fn handle_timer(&mut self, timer: MacTimer, sim: &mut Simulator, medium: &mut Medium) {
        match timer {
            MacTimer::Poll => {
                if self.poll_at.is_some_and(|t| t <= sim.now()) {
                    self.poll_at = None;
                }
                self.try_send(sim, medium);
            }
            MacTimer::Process { from, frame } => self.process(from, frame, sim, medium),
            MacTimer::RtsTimeout { generation } => {
                if self.is_current(generation, MacState::Wait) && self.awaiting_cts {
                    self.enter_backoff(sim, medium);
                }
            }
            MacTimer::BackoffDone { generation } => {
                if self.is_current(generation, MacState::Backoff) {
                    debug!(node = %self.id, "退避结束，重试");
                    self.set_state(MacState::Idle, sim.now(), medium);
                    self.try_send(sim, medium);
                }
            }
            MacTimer::CtsTimeout { generation } => {
                if self.is_current(generation, MacState::RtsReceived) {
                    debug!(node = %self.id, peer = ?self.peer, "发送方未跟进，回到 IDLE");
                    self.peer = None;
                    self.set_state(MacState::Idle, sim.now(), medium);
                    self.release_deferred(sim, medium);
                    self.try_send(sim, medium);
                }
            }
            MacTimer::QuietDone { generation } => {
                if self.is_current(generation, MacState::Wait) && !self.awaiting_cts {
                    self.set_state(MacState::Idle, sim.now(), medium);
                    self.try_send(sim, medium);
                }
            }
            MacTimer::SendData { generation } => {
                if self.is_current(generation, MacState::Sending) {
                    self.send_data(generation, sim, medium);
                }
            }
            MacTimer::AckTimeout { generation } => {
                if self.is_current(generation, MacState::Sending) {
                    // 队首不出队，窗口也不再惩罚一次
                    warn!(node = %self.id, peer = ?self.peer, "⏰ 未收到 ACK，稍后重试");
                    self.stats.ack_timeouts += 1;
                    self.peer = None;
                    self.set_state(MacState::Idle, sim.now(), medium);
                    self.try_send(sim, medium);
                }
            }
            MacTimer::RxDone { generation } => {
                if self.is_current(generation, MacState::Receiving) {
                    self.finish_receive(sim, medium);
                }
            }
        }
    }

    /// 自己的 RTS 在等 CTS、正在退避，或退避后尚未预约成功
    fn contending(&self) -> bool {
        self.retrying
            || self.state == MacState::Backoff
            || (self.state == MacState::Wait && self.awaiting_cts)
    }

    fn is_current(&self, generation: u64, state: MacState) -> bool {
        self.generation == generation && self.state == state
    }

    fn set_state(&mut self, to: MacState, now: SimTime, medium: &mut Medium) -> u64 {
        let from = self.state;
        self.state = to;
        self.generation = self.generation.wrapping_add(1);
        if from != to {
            trace!(node = %self.id, ?from, ?to, "MAC 状态迁移");
            medium.record(self.id, now, TraceKind::MacState { from, to });
        }
        self.generation
    }

    fn arm(&mut self, delay: SimTime, timer: MacTimer, sim: &mut Simulator, medium: &mut Medium) {
        medium.schedule_timer(self.id, delay, Timer::Mac(timer), sim);
    }

    fn send(&mut self, frame: MacFrame, sim: &mut Simulator, medium: &mut Medium) {
        debug!(node = %self.id, kind = ?frame.kind(), target = %frame.target(), "📤 发送");
        medium.broadcast(self.id, Frame::Mac(frame), sim);
    }

    fn schedule_poll(&mut self, at: SimTime, sim: &mut Simulator, medium: &mut Medium) {
        let now = sim.now();
        if self.poll_at.is_some_and(|pending| pending <= at && pending >= now) {
            return;
        }
        self.poll_at = Some(at);
        self.arm(at.saturating_sub(now), MacTimer::Poll, sim, medium);
    }

    /// 发送循环的一次迭代：空闲且队首可发时发出 RTS
    fn try_send(&mut self, sim: &mut Simulator, medium: &mut Medium) {
        if self.state != MacState::Idle {
            return;
        }
        let now = sim.now();
        let Some(head) = self.queue.head() else {
            return;
        };
        let (destination, length) = (head.destination, head.length);

        let mut ready_at = head.not_before.max(self.quiet_until);
        if let Some(&until) = self.busy.get(&destination) {
            if until > now {
                ready_at = ready_at.max(until);
            } else {
                self.busy.remove(&destination);
            }
        }
        if ready_at > now {
            trace!(node = %self.id, %ready_at, "队首暂不可发");
            self.schedule_poll(ready_at, sim, medium);
            return;
        }

        self.peer = Some(destination);
        self.awaiting_cts = true;
        let generation = self.set_state(MacState::Wait, now, medium);
        let backoff = self.backoff.window();
        self.stats.rts_sent += 1;
        self.send(
            MacFrame::Rts {
                target: destination,
                length,
                backoff,
            },
            sim,
            medium,
        );
        let timeout = self.cfg.handshake_timeout();
        self.arm(timeout, MacTimer::RtsTimeout { generation }, sim, medium);
    }

    fn enter_backoff(&mut self, sim: &mut Simulator, medium: &mut Medium) {
        self.awaiting_cts = false;
        self.retrying = true;
        self.peer = None;
        if let Some(stale) = self.deferred_rts.take() {
            trace!(node = %self.id, %stale, "退避，放弃待唤醒的 RTS 发送方");
        }
        let generation = self.set_state(MacState::Backoff, sim.now(), medium);
        let slots = self.backoff.draw_slots(medium.rng());
        self.backoff.increase();
        self.stats.backoffs += 1;
        self.stats.max_window = self.stats.max_window.max(self.backoff.window());
        info!(
            node = %self.id,
            slots,
            window = self.backoff.window(),
            "⏳ 未收到 CTS，退避"
        );
        let wait = self.cfg.slot_time().saturating_mul(slots as u64);
        self.arm(wait, MacTimer::BackoffDone { generation }, sim, medium);
    }

    /// 帧内容处理（空中时间已过）
    fn process(&mut self, from: NodeId, frame: MacFrame, sim: &mut Simulator, medium: &mut Medium) {
        let now = sim.now();
        let for_me = frame.target() == self.id;
        if !for_me {
            if let Some(overheard) = frame.backoff() {
                // 竞争中只向上同步
                let overheard = if self.contending() {
                    overheard.max(self.backoff.window())
                } else {
                    overheard
                };
                self.backoff.sync(overheard);
            }
        }

        match frame {
            MacFrame::Rts { length, .. } if for_me => {
                if self.state == MacState::Idle {
                    debug!(node = %self.id, %from, length, "收到 RTS，回复 CTS");
                    self.peer = Some(from);
                    self.rx_length = length;
                    let generation = self.set_state(MacState::RtsReceived, now, medium);
                    self.stats.cts_sent += 1;
                    let backoff = self.backoff.window();
                    self.send(
                        MacFrame::Cts {
                            target: from,
                            length,
                            backoff,
                        },
                        sim,
                        medium,
                    );
                    let timeout = self.cfg.handshake_timeout();
                    self.arm(timeout, MacTimer::CtsTimeout { generation }, sim, medium);
                } else {
                    debug!(node = %self.id, %from, state = ?self.state, "锁定期间收到 RTS，不回复");
                    if self.deferred_rts.is_none() && self.peer != Some(from) {
                        self.deferred_rts = Some(from);
                    }
                }
            }
            MacFrame::Rts { target, .. } => {
                if self.state == MacState::Idle {
                    trace!(node = %self.id, %from, %target, "旁听 RTS，静默");
                    self.awaiting_cts = false;
                    let generation = self.set_state(MacState::Wait, now, medium);
                    let quiet = self.cfg.handshake_timeout();
                    self.arm(quiet, MacTimer::QuietDone { generation }, sim, medium);
                }
            }
            MacFrame::Cts { .. } if for_me => {
                if self.state == MacState::Wait && self.awaiting_cts && self.peer == Some(from) {
                    self.on_cts(sim, medium);
                } else {
                    debug!(node = %self.id, %from, state = ?self.state, "意外的 CTS");
                }
            }
            MacFrame::Cts { length, .. } => {
                let reservation = self.cfg.reservation_time(length);
                match self.state {
                    MacState::Idle => {
                        self.awaiting_cts = false;
                        let generation = self.set_state(MacState::Wait, now, medium);
                        self.arm(reservation, MacTimer::QuietDone { generation }, sim, medium);
                    }
                    MacState::Wait if !self.awaiting_cts => {
                        let generation = self.set_state(MacState::Wait, now, medium);
                        self.arm(reservation, MacTimer::QuietDone { generation }, sim, medium);
                    }
                    MacState::Wait | MacState::Backoff => {
                        self.quiet_until = self.quiet_until.max(now.saturating_add(reservation));
                    }
                    _ => {}
                }
            }
            MacFrame::Ds { length, .. } if for_me => {
                if self.state == MacState::RtsReceived && self.peer == Some(from) {
                    trace!(node = %self.id, %from, length, "收到 DS");
                    self.rx_length = length;
                }
            }
            MacFrame::Ds { target, length, .. } => {
                // 发送方与接收方在 DATA 结束前都不该被 RTS
                let until = now
                    .saturating_add(self.cfg.airtime(self.cfg.settle_bytes))
                    .saturating_add(self.cfg.airtime(length));
                trace!(node = %self.id, %from, %target, %until, "邻居忙");
                for neighbour in [from, target] {
                    let entry = self.busy.entry(neighbour).or_insert(until);
                    *entry = (*entry).max(until);
                }
            }
            MacFrame::Ack { .. } if for_me => {
                if self.state == MacState::Sending && self.peer == Some(from) {
                    self.on_ack(sim, medium);
                } else {
                    debug!(node = %self.id, %from, state = ?self.state, "多余的 ACK");
                }
            }
            MacFrame::Ack { target, .. } => {
                // 他人握手结束：被挡住的节点可以重试
                self.busy.remove(&from);
                self.busy.remove(&target);
                self.quiet_until = now;
                if self.state == MacState::Wait && !self.awaiting_cts {
                    self.set_state(MacState::Idle, now, medium);
                }
                self.try_send(sim, medium);
            }
            MacFrame::Rrts { .. } if for_me => {
                let wanted = self
                    .queue
                    .head()
                    .is_some_and(|h| h.destination == from && h.not_before <= now);
                if wanted && matches!(self.state, MacState::Idle | MacState::Backoff) {
                    debug!(node = %self.id, %from, "收到 RRTS，立即重试 RTS");
                    if self.state == MacState::Backoff {
                        self.set_state(MacState::Idle, now, medium);
                    }
                    self.busy.remove(&from);
                    self.quiet_until = now;
                    self.try_send(sim, medium);
                }
            }
            MacFrame::Rrts { .. } | MacFrame::Data { .. } => {}
        }
    }

    fn on_cts(&mut self, sim: &mut Simulator, medium: &mut Medium) {
        let Some(peer) = self.peer else {
            return;
        };
        let Some(length) = self.queue.head().map(|h| h.length) else {
            return;
        };
        // 预约成功：线性减小窗口
        self.backoff.decrease();
        self.awaiting_cts = false;
        self.retrying = false;
        let generation = self.set_state(MacState::Sending, sim.now(), medium);
        debug!(node = %self.id, %peer, "收到 CTS，发送 DS");
        let backoff = self.backoff.window();
        self.send(
            MacFrame::Ds {
                target: peer,
                length,
                backoff,
            },
            sim,
            medium,
        );
        let settle = self.cfg.settle_delay();
        self.arm(settle, MacTimer::SendData { generation }, sim, medium);
    }

    fn send_data(&mut self, generation: u64, sim: &mut Simulator, medium: &mut Medium) {
        let (Some(peer), Some(head)) = (self.peer, self.queue.head()) else {
            return;
        };
        let (length, payload) = (head.length, head.payload);
        self.data_seq += 1;
        self.stats.data_sent += 1;
        self.send(
            MacFrame::Data {
                target: peer,
                length,
                seq: self.data_seq,
                payload,
            },
            sim,
            medium,
        );
        let timeout = self.cfg.ack_timeout(length);
        self.arm(timeout, MacTimer::AckTimeout { generation }, sim, medium);
    }

    fn on_ack(&mut self, sim: &mut Simulator, medium: &mut Medium) {
        let now = sim.now();
        let Some(entry) = self.queue.pop_head() else {
            return;
        };
        self.backoff.reset();
        self.stats.acks_received += 1;
        self.stats.first_ack_at.get_or_insert(now);
        info!(
            node = %self.id,
            to = %entry.destination,
            length = entry.length,
            remaining = self.queue.len(),
            "✅ 收到 ACK"
        );
        self.indications.push(MacIndication::Sent {
            to: entry.destination,
            length: entry.length,
        });
        self.peer = None;
        self.set_state(MacState::Idle, now, medium);
        self.try_send(sim, medium);
    }

    fn begin_receive(
        &mut self,
        from: NodeId,
        length: u32,
        payload: Option<RouteMsg>,
        sim: &mut Simulator,
        medium: &mut Medium,
    ) {
        let expected = match self.state {
            MacState::RtsReceived => self.peer == Some(from),
            MacState::Idle => true,
            _ => false,
        };
        if !expected {
            debug!(node = %self.id, %from, state = ?self.state, "忽略 DATA");
            return;
        }
        self.peer = Some(from);
        self.rx_length = length;
        self.rx_payload = payload;
        let generation = self.set_state(MacState::Receiving, sim.now(), medium);
        let airtime = self.cfg.airtime(length);
        self.arm(airtime, MacTimer::RxDone { generation }, sim, medium);
    }

    fn finish_receive(&mut self, sim: &mut Simulator, medium: &mut Medium) {
        let now = sim.now();
        let Some(from) = self.peer.take() else {
            return;
        };
        let length = self.rx_length;
        let payload = self.rx_payload.take();
        self.set_state(MacState::Idle, now, medium);

        info!(node = %self.id, %from, length, "📦 DATA 接收完成");
        medium.stats.delivered_payloads += 1;
        medium.stats.delivered_bytes += length as u64;
        medium.record(
            self.id,
            now,
            TraceKind::Delivered {
                from: from.0,
                length,
            },
        );
        self.indications.push(MacIndication::Received {
            from,
            length,
            payload,
        });

        self.stats.acks_sent += 1;
        let backoff = self.backoff.window();
        self.send(MacFrame::Ack { target: from, backoff }, sim, medium);
        self.release_deferred(sim, medium);
        self.try_send(sim, medium);
    }

    fn release_deferred(&mut self, sim: &mut Simulator, medium: &mut Medium) {
        if let Some(target) = self.deferred_rts.take() {
            debug!(node = %self.id, %target, "发送 RRTS");
            self.stats.rrts_sent += 1;
            self.send(MacFrame::Rrts { target }, sim, medium);
        }
    }
}

impl Node for MacawNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn on_frame(&mut self, from: NodeId, frame: Frame, sim: &mut Simulator, medium: &mut Medium) {
        match frame {
            Frame::Mac(f) => self.on_mac_frame(from, f, sim, medium),
            Frame::Route(m) => {
                trace!(node = %self.id, kind = ?m.frame_kind(), "纯 MAC 节点忽略路由帧");
            }
        }
        // 纯 MAC 节点没有上层，指示直接丢弃
        self.indications.clear();
    }

    fn on_timer(&mut self, timer: Timer, sim: &mut Simulator, medium: &mut Medium) {
        if let Timer::Mac(t) = timer {
            self.handle_timer(t, sim, medium);
        }
        self.indications.clear();
    }

    fn mac(&self) -> Option<&MacawNode> {
        Some(self)
    }

    fn mac_mut(&mut self) -> Option<&mut MacawNode> {
        Some(self)
    }
}
