//! AODV 按需路由
//!
//! 路由发现（RREQ 洪泛 + RREP 沿反向路径回送）、基于序列号/跳数的表项准入、
//! 下一跳存活检查与 RERR 回报。可直接运行在介质上，也可运行在 MACAW 之上。

mod config;
mod node;
mod table;
mod transfer;

pub use config::AodvConfig;
pub use node::{AodvNode, AodvStats, LinkMode, RouteTimer};
pub use table::{RouteEntry, RoutingTable, SELF_SEQ};
pub use transfer::{Transfer, TransferState};
