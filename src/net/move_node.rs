//! 节点移动事件（拓扑脚本中的 "node moved"）

use super::id::{NodeId, Position};
use super::radio_world::RadioWorld;
use crate::sim::{Event, Simulator, World};

/// 事件：把节点移动到新位置，之后的邻居计算立即生效。
#[derive(Debug)]
pub struct MoveNode {
    pub node: NodeId,
    pub to: Position,
}

impl Event for MoveNode {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let MoveNode { node, to } = *self;
        let Some(w) = RadioWorld::downcast(world) else {
            return;
        };
        w.medium.move_node(node, to, sim.now());
    }
}
