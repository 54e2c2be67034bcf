//! 无线网络模块
//!
//! 此模块包含无线仿真的基底：节点标识、空中帧、共享介质、节点接口与交付事件。

// 子模块声明
mod deliver_frame;
mod frame;
mod id;
mod medium;
mod move_node;
mod node;
mod node_timer;
mod radio_world;
mod stats;

// 重新导出公共接口
pub use deliver_frame::DeliverFrame;
pub use frame::{Frame, FrameKind, MacFrame, RouteKind, RouteMsg};
pub use id::{NodeId, Position};
pub use medium::Medium;
pub use move_node::MoveNode;
pub use node::Node;
pub use node_timer::{NodeTimer, Timer};
pub use radio_world::RadioWorld;
pub use stats::Stats;
