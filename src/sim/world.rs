//! 世界 trait

use std::any::Any;

/// 仿真世界：事件通过 `as_any_mut` 取回具体类型（例如持有介质的 `RadioWorld`）。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
