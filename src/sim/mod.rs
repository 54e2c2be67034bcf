//! 离散事件内核
//!
//! 单一时间线上的事件队列：所有节点的协议进程都以事件的形式在这里交错执行。

mod event;
mod scheduled_event;
mod simulator;
mod time;
mod world;

pub use event::Event;
pub use simulator::Simulator;
pub use time::SimTime;
pub use world::World;
