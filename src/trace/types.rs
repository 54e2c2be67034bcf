use serde::{Deserialize, Serialize};

use crate::mac::MacState;
use crate::net::FrameKind;

/// 追踪事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceKind {
    /// 节点发出一个帧（广播时 `target` 为帧内目标，路由广播为 None）
    Tx {
        frame: FrameKind,
        target: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        length: Option<u32>,
    },
    /// MAC 状态寄存器变化
    MacState { from: MacState, to: MacState },
    /// 接收期间到达了不该到达的帧
    Collision { frame: FrameKind, sender: usize },
    /// 路由表行被创建或替换
    RouteUpdate {
        dest: usize,
        next: usize,
        seq: u32,
        hops: u32,
    },
    /// 路由表行被删除
    RouteRemoved { dest: usize },
    /// 载荷交付给上层（MAC 收齐 DATA，或路由数据到达目的地）
    Delivered { from: usize, length: u32 },
    /// 节点移动
    Moved { x: f64, y: f64 },
}

/// 一个可回放的事件（JSON）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    pub node: usize,
    #[serde(flatten)]
    pub kind: TraceKind,
}

/// 一个简单的事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, ev: TraceEvent) {
        self.events.push(ev);
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }

    /// 某个节点依次发出的帧类型
    pub fn tx_kinds(&self) -> Vec<(usize, FrameKind)> {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                TraceKind::Tx { frame, .. } => Some((e.node, frame)),
                _ => None,
            })
            .collect()
    }

    /// 某个节点经历过的 MAC 状态迁移
    pub fn mac_transitions(&self, node: usize) -> Vec<(MacState, MacState)> {
        self.events
            .iter()
            .filter(|e| e.node == node)
            .filter_map(|e| match e.kind {
                TraceKind::MacState { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }
}
