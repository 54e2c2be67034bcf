//! 无线世界实现
//!
//! 定义无线仿真的世界（World）实现，持有介质与全部节点。

use super::medium::Medium;
use crate::sim::World;
use std::any::Any;
use tracing::error;

/// 一个默认的无线世界实现：持有 Medium。
#[derive(Default)]
pub struct RadioWorld {
    pub medium: Medium,
}

impl RadioWorld {
    /// 以给定随机种子创建（同一种子 => 同一运行结果）
    pub fn with_seed(seed: u64) -> Self {
        Self {
            medium: Medium::with_seed(seed),
        }
    }

    /// 事件执行时取回无线世界；其它世界类型记录错误并返回 `None`
    pub fn downcast(world: &mut dyn World) -> Option<&mut RadioWorld> {
        let w = world.as_any_mut().downcast_mut::<RadioWorld>();
        if w.is_none() {
            error!("world must be RadioWorld");
        }
        w
    }
}

impl World for RadioWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
