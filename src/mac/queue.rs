//! MAC 发送队列
//!
//! 先进先出；只有队首条目处于活动状态，且仅在收到对应 ACK 时出队。

use std::collections::VecDeque;

use crate::net::{NodeId, RouteMsg};
use crate::sim::SimTime;

/// 待发送的数据
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub length: u32,
    pub destination: NodeId,
    /// 早于此时刻不尝试发送
    pub not_before: SimTime,
    /// 上层（路由）消息，纯 MAC 仿真时为 None
    pub payload: Option<RouteMsg>,
}

#[derive(Debug, Default)]
pub struct SendQueue {
    q: VecDeque<QueueEntry>,
    bytes: u64,
}

impl SendQueue {
    pub fn push(&mut self, entry: QueueEntry) {
        self.bytes = self.bytes.saturating_add(entry.length as u64);
        self.q.push_back(entry);
    }

    pub fn head(&self) -> Option<&QueueEntry> {
        self.q.front()
    }

    /// 队首出队（仅由 ACK 触发）
    pub(crate) fn pop_head(&mut self) -> Option<QueueEntry> {
        let entry = self.q.pop_front()?;
        self.bytes = self.bytes.saturating_sub(entry.length as u64);
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.q.iter()
    }
}
