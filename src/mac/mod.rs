//! MACAW 介质访问控制
//!
//! 基于竞争的 RTS/CTS/DS/DATA/ACK 四（五）次握手，带 MILD 退避与退避值捎带同步。

mod backoff;
mod config;
mod node;
mod queue;
mod state;

pub use backoff::Backoff;
pub use config::MacConfig;
pub use node::{MacIndication, MacStats, MacTimer, MacawNode};
pub use queue::{QueueEntry, SendQueue};
pub use state::MacState;
