//! 流量注入事件

use crate::net::{NodeId, RadioWorld};
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::warn;

/// 事件：在 MAC 层为 `destination` 排队数据
#[derive(Debug)]
pub struct EnqueueData {
    pub node: NodeId,
    pub length: u32,
    pub destination: NodeId,
    pub offset: SimTime,
}

impl Event for EnqueueData {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let EnqueueData {
            node,
            length,
            destination,
            offset,
        } = *self;
        let Some(w) = RadioWorld::downcast(world) else {
            return;
        };
        if !w.medium.enqueue_data(node, length, destination, offset, sim) {
            warn!(%node, "节点没有 MAC 层，忽略 enqueue");
        }
    }
}

/// 事件：路由层 `send_to`
#[derive(Debug)]
pub struct SendTo {
    pub node: NodeId,
    pub destination: NodeId,
}

impl Event for SendTo {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let SendTo { node, destination } = *self;
        let Some(w) = RadioWorld::downcast(world) else {
            return;
        };
        if !w.medium.send_to(node, destination, sim) {
            warn!(%node, "节点没有路由层，忽略 send_to");
        }
    }
}
