//! 基站（星形）拓扑

use std::f64::consts::TAU;

use crate::net::{Node, NodeId, Position, RadioWorld};

#[derive(Debug, Clone)]
pub struct StarOpts {
    pub leaves: usize,
    pub center: Position,
    /// 叶子到基站的距离
    pub radius: f64,
    pub tx_range: f64,
}

impl Default for StarOpts {
    fn default() -> Self {
        Self {
            leaves: 2,
            center: Position::new(325.0, 200.0),
            radius: 100.0,
            tx_range: 200.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StarTopology {
    pub hub: NodeId,
    pub leaves: Vec<NodeId>,
}

/// 构建星形拓扑：基站先加入（id 最小），叶子均匀分布在圆周上
pub fn build_star<F>(world: &mut RadioWorld, opts: &StarOpts, mut make: F) -> StarTopology
where
    F: FnMut(NodeId) -> Box<dyn Node>,
{
    let hub = world.medium.add_node(opts.center, opts.tx_range, &mut make);
    let leaves = (0..opts.leaves)
        .map(|i| {
            // 从基站左侧开始摆放
            let angle = TAU * i as f64 / opts.leaves.max(1) as f64 + std::f64::consts::PI;
            let pos = Position::new(
                opts.center.x + opts.radius * angle.cos(),
                opts.center.y + opts.radius * angle.sin(),
            );
            world.medium.add_node(pos, opts.tx_range, &mut make)
        })
        .collect();
    StarTopology { hub, leaves }
}
