//! 节点类型
//!
//! 定义无线节点接口。每个节点独占自己的状态；节点之间只通过介质投递的帧通信。

use super::frame::Frame;
use super::id::NodeId;
use super::medium::Medium;
use super::node_timer::Timer;
use crate::aodv::AodvNode;
use crate::mac::MacawNode;
use crate::sim::Simulator;

/// 节点接口
pub trait Node: Send {
    /// 获取节点标识符
    fn id(&self) -> NodeId;

    /// 处理到达的帧（`from` 为发送方）
    fn on_frame(&mut self, from: NodeId, frame: Frame, sim: &mut Simulator, medium: &mut Medium);

    /// 处理到期的定时器（协作式挂起点的续体）
    fn on_timer(&mut self, timer: Timer, sim: &mut Simulator, medium: &mut Medium);

    /// MAC 层（若有），只读
    fn mac(&self) -> Option<&MacawNode> {
        None
    }

    fn mac_mut(&mut self) -> Option<&mut MacawNode> {
        None
    }

    /// 路由层（若有），只读
    fn router(&self) -> Option<&AodvNode> {
        None
    }

    fn router_mut(&mut self) -> Option<&mut AodvNode> {
        None
    }
}
