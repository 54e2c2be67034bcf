//! 帧交付事件
//!
//! 定义无线介质上的帧交付事件。

use super::frame::Frame;
use super::id::NodeId;
use super::radio_world::RadioWorld;
use crate::sim::{Event, Simulator, World};
use tracing::trace;

/// 事件：把一个帧交给某个节点处理。
#[derive(Debug)]
pub struct DeliverFrame {
    pub to: NodeId,
    pub from: NodeId,
    pub frame: Frame,
}

impl Event for DeliverFrame {
    #[tracing::instrument(level = "trace", skip(self, sim, world), fields(to = %self.to, from = %self.from, kind = ?self.frame.kind()))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverFrame { to, from, frame } = *self;
        trace!(now = %sim.now(), "📨 帧到达节点");

        let Some(w) = RadioWorld::downcast(world) else {
            return;
        };
        w.medium.deliver(to, from, frame, sim);
    }
}
