use std::path::PathBuf;

use thiserror::Error;

/// 场景加载/校验错误
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scenario has no nodes")]
    NoNodes,
    #[error("{context} references unknown node {node} (scenario has {count} nodes)")]
    UnknownNode {
        context: &'static str,
        node: usize,
        count: usize,
    },
    #[error("traffic entry {index} sends from node {node} to itself")]
    SelfTraffic { index: usize, node: usize },
    #[error("node {node} has invalid tx_range {tx_range}")]
    BadRange { node: usize, tx_range: f64 },
    #[error("{field} must be a finite, non-negative number of seconds (got {value})")]
    BadTime { field: &'static str, value: f64 },
}

impl ScenarioError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScenarioError::Io {
            path: path.into(),
            source,
        }
    }
}
