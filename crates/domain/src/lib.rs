//! 任务域模型：任务描述符、业务逻辑接口与监听器契约。

pub mod listener;
pub mod task;
pub mod value_objects;

pub use listener::{OverflowListener, TaskEventListener};
pub use task::{compute_fn, Computable, TimerTask, TimerTaskBuilder};
pub use value_objects::{Payload, ShutdownMode, TerminalState};
