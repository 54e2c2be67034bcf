//! 统计信息
//!
//! 定义无线仿真统计数据结构。

use std::collections::BTreeMap;

use super::frame::FrameKind;
use super::id::NodeId;

/// 介质级统计信息
#[derive(Debug, Default, Clone)]
pub struct Stats {
    /// 按帧类型统计的发送次数
    pub frames_sent: BTreeMap<FrameKind, u64>,
    /// 每个节点收到的帧数（网络利用率）
    pub frames_received: Vec<u64>,
    /// 向上层交付的载荷
    pub delivered_payloads: u64,
    pub delivered_bytes: u64,
    /// 接收期间检测到的冲突
    pub collisions: u64,
    /// 下一跳不在范围内而丢弃的单播帧
    pub dropped_unicasts: u64,
}

impl Stats {
    pub fn sent(&self, kind: FrameKind) -> u64 {
        self.frames_sent.get(&kind).copied().unwrap_or(0)
    }

    pub fn received_by(&self, node: NodeId) -> u64 {
        self.frames_received.get(node.0).copied().unwrap_or(0)
    }

    pub fn total_received(&self) -> u64 {
        self.frames_received.iter().sum()
    }

    pub(crate) fn record_tx(&mut self, kind: FrameKind) {
        *self.frames_sent.entry(kind).or_insert(0) += 1;
    }

    pub(crate) fn record_rx_slot(&mut self, node: NodeId) {
        if self.frames_received.len() <= node.0 {
            self.frames_received.resize(node.0 + 1, 0);
        }
    }

    pub(crate) fn record_rx(&mut self, node: NodeId) {
        self.record_rx_slot(node);
        self.frames_received[node.0] += 1;
    }
}
