//! 测试共享设施：任务体/监听器的测试替身和通用辅助函数。
//! 以 dev-dependency 的形式被其他 crate 使用。

pub mod helpers;
pub mod mocks;

pub use helpers::*;
pub use mocks::*;
