//! 直线拓扑

use crate::net::{Node, NodeId, Position, RadioWorld};

/// 直线拓扑配置选项
#[derive(Debug, Clone)]
pub struct LineOpts {
    pub count: usize,
    /// 第一个节点的位置，其余沿 x 轴排开
    pub origin: Position,
    pub spacing: f64,
    pub tx_range: f64,
}

impl Default for LineOpts {
    fn default() -> Self {
        Self {
            count: 4,
            origin: Position::new(175.0, 200.0),
            spacing: 100.0,
            tx_range: 100.0,
        }
    }
}

/// 构建直线拓扑
///
/// 拓扑结构：n0 - n1 - ... - n(k-1)，默认间距等于发射半径，只有相邻节点互相可达。
pub fn build_line<F>(world: &mut RadioWorld, opts: &LineOpts, mut make: F) -> Vec<NodeId>
where
    F: FnMut(NodeId) -> Box<dyn Node>,
{
    (0..opts.count)
        .map(|i| {
            let pos = Position::new(opts.origin.x + opts.spacing * i as f64, opts.origin.y);
            world.medium.add_node(pos, opts.tx_range, &mut make)
        })
        .collect()
}
