//! 仿真事件追踪（用于离线分析/回放）
//!
//! 设计目标：
//! - **结构化**：用 JSON 事件而不是解析文本日志
//! - **轻量**：内存收集，仿真结束后一次性写出
//! - **无副作用**：只记录，不参与任何协议决策

mod types;

pub use types::{TraceEvent, TraceKind, TraceLog};
