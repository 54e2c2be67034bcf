//! 事件 trait

use super::simulator::Simulator;
use super::world::World;

/// 一个在某个仿真时刻执行的动作：帧到达、定时器到期、节点移动或流量注入。
///
/// 以 `self: Box<Self>` 消费自身，事件携带的帧可以直接移交给接收方。
pub trait Event: 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
