//! 按需路由表
//!
//! 每个已知目的地一行：下一跳、序列号、跳数。始终包含一条指向自己的行，
//! 其序列号为哨兵值，使得绕回自己的 RREQ/RREP 永远不会被接纳。

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::net::NodeId;

/// 自身行使用的序列号哨兵
pub const SELF_SEQ: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub next: NodeId,
    pub seq: u32,
    pub hops: u32,
}

#[derive(Debug, Clone)]
pub struct RoutingTable {
    owner: NodeId,
    rows: BTreeMap<NodeId, RouteEntry>,
}

impl RoutingTable {
    pub fn new(owner: NodeId) -> Self {
        let mut rows = BTreeMap::new();
        rows.insert(
            owner,
            RouteEntry {
                next: owner,
                seq: SELF_SEQ,
                hops: 0,
            },
        );
        Self { owner, rows }
    }

    /// 准入规则：目的地未知，或序列号更新，或序列号相同但跳数更少时替换该行。
    ///
    /// 返回是否接纳；不接纳的候选即为过期/重复帧。
    pub fn admit(&mut self, dest: NodeId, next: NodeId, seq: u32, hops: u32) -> bool {
        let accept = match self.rows.get(&dest) {
            None => true,
            Some(row) => seq > row.seq || (seq == row.seq && hops < row.hops),
        };
        if accept {
            self.rows.insert(dest, RouteEntry { next, seq, hops });
        }
        accept
    }

    pub fn get(&self, dest: NodeId) -> Option<&RouteEntry> {
        self.rows.get(&dest)
    }

    pub fn contains(&self, dest: NodeId) -> bool {
        self.rows.contains_key(&dest)
    }

    /// 删除一行；自身行不可删除。
    pub fn remove(&mut self, dest: NodeId) -> Option<RouteEntry> {
        if dest == self.owner {
            return None;
        }
        self.rows.remove(&dest)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按目的地排序的快照（用于日志/展示）
    pub fn snapshot(&self) -> Vec<(NodeId, RouteEntry)> {
        self.rows.iter().map(|(d, r)| (*d, *r)).collect()
    }

    /// 文本表格形式
    pub fn render(&self) -> String {
        let dashes = "-".repeat(4 * 10 + 3);
        let mut out = String::new();
        let _ = writeln!(out, "Routing table of node {}", self.owner.0);
        let _ = writeln!(out, "+{dashes}+");
        let _ = writeln!(out, "| {:<8}| {:<8}| {:<10}| {:<8}|", "Dest", "Next", "Seq", "Hops");
        let _ = writeln!(out, "+{dashes}+");
        for (dest, row) in &self.rows {
            let seq = if row.seq == SELF_SEQ {
                "-".to_string()
            } else {
                row.seq.to_string()
            };
            let _ = writeln!(
                out,
                "| {:<8}| {:<8}| {:<10}| {:<8}|",
                dest.0, row.next.0, seq, row.hops
            );
        }
        let _ = writeln!(out, "+{dashes}+");
        out
    }
}
