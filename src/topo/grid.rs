//! 带随机扰动的网格拓扑

use rand::Rng;

use crate::net::{Node, NodeId, Position, RadioWorld};

/// 网格拓扑配置选项
#[derive(Debug, Clone)]
pub struct GridOpts {
    pub cols: usize,
    pub rows: usize,
    pub origin: Position,
    pub spacing: f64,
    /// 每个坐标叠加 U[-jitter, jitter] 的扰动（取自介质的随机源）
    pub jitter: f64,
    pub tx_range: f64,
}

impl Default for GridOpts {
    fn default() -> Self {
        Self {
            cols: 7,
            rows: 7,
            origin: Position::new(80.0, 80.0),
            spacing: 440.0 / 6.0,
            jitter: 20.0,
            tx_range: 95.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridTopology {
    pub cols: usize,
    pub rows: usize,
    /// 按列优先顺序：`nodes[col * rows + row]`
    pub nodes: Vec<NodeId>,
}

impl GridTopology {
    pub fn node(&self, col: usize, row: usize) -> NodeId {
        assert!(col < self.cols && row < self.rows, "grid index out of range");
        self.nodes[col * self.rows + row]
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }
}

/// 构建 cols × rows 网格
pub fn build_grid<F>(world: &mut RadioWorld, opts: &GridOpts, mut make: F) -> GridTopology
where
    F: FnMut(NodeId) -> Box<dyn Node>,
{
    let mut nodes = Vec::with_capacity(opts.cols * opts.rows);
    for col in 0..opts.cols {
        for row in 0..opts.rows {
            let (dx, dy) = if opts.jitter > 0.0 {
                let rng = world.medium.rng();
                (
                    rng.gen_range(-opts.jitter..=opts.jitter),
                    rng.gen_range(-opts.jitter..=opts.jitter),
                )
            } else {
                (0.0, 0.0)
            };
            let pos = Position::new(
                opts.origin.x + opts.spacing * col as f64 + dx,
                opts.origin.y + opts.spacing * row as f64 + dy,
            );
            nodes.push(world.medium.add_node(pos, opts.tx_range, &mut make));
        }
    }
    GridTopology {
        cols: opts.cols,
        rows: opts.rows,
        nodes,
    }
}
