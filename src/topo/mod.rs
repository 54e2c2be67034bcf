//! 节点摆放
//!
//! 拓扑构建器只负责位置与发射半径；节点本身由调用方提供的构造闭包创建，
//! 因此纯 MAC 世界与 AODV 世界共用同一套构建器。

mod grid;
mod line;
mod star;

pub use grid::{GridOpts, GridTopology, build_grid};
pub use line::{LineOpts, build_line};
pub use star::{StarOpts, StarTopology, build_star};
