//! JSON 场景
//!
//! 一个场景描述节点摆放、使用哪一层协议、流量注入与节点移动脚本；
//! `ScenarioSpec::build` 把它变成可直接运行的 `(Simulator, RadioWorld)`。

mod error;
mod spec;
mod traffic;

pub use error::ScenarioError;
pub use spec::{AodvOverrides, Layer, MacOverrides, MoveSpec, NodeSpec, ScenarioSpec, TrafficSpec};
pub use traffic::{EnqueueData, SendTo};
