//! 调度执行层：任务队列、调度循环、工作池与引擎组合根。

pub mod dispatcher;
pub mod engine;
pub mod work_queue;
pub mod worker_pool;

pub use dispatcher::Dispatcher;
pub use engine::{global_engine, global_engine_with, SchedulerEngine};
pub use work_queue::WorkQueue;
pub use worker_pool::{PoolSizing, TokioWorkerPool, WorkerPool};
