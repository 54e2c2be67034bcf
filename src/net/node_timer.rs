//! 节点定时器事件
//!
//! 协作式挂起（"在这里暂停，T 时刻继续"）被表示为一个在 T 时刻触发的 `NodeTimer`，
//! 由对应节点的 `on_timer` 继续执行。

use super::id::NodeId;
use super::radio_world::RadioWorld;
use crate::aodv::RouteTimer;
use crate::mac::MacTimer;
use crate::sim::{Event, Simulator, World};

/// 某一层协议的定时器
#[derive(Debug, Clone)]
pub enum Timer {
    Mac(MacTimer),
    Route(RouteTimer),
}

/// 事件：在指定节点上触发定时器。
#[derive(Debug)]
pub struct NodeTimer {
    pub node: NodeId,
    pub timer: Timer,
}

impl Event for NodeTimer {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let NodeTimer { node, timer } = *self;
        let Some(w) = RadioWorld::downcast(world) else {
            return;
        };
        w.medium.fire_timer(node, timer, sim);
    }
}
