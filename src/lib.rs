//! 进程内周期任务调度引擎
//!
//! 把需要重复执行的后台工作描述成 [`TimerTask`]，提交给调度引擎后由
//! 单一的调度循环轮转评估，到期的任务交给工作池并发执行。支持固定
//! 重复次数、守护任务、防重叠执行和取消/完成/过期三类终止回调。
//!
//! ```no_run
//! use std::time::Duration;
//! use tickflow::{compute_fn, TimerTask};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = tickflow::bootstrap(None).await?;
//!
//!     let task = TimerTask::builder("heartbeat")
//!         .period(Duration::from_secs(5))
//!         .daemon(true)
//!         .build(compute_fn(|| {
//!             Box::pin(async {
//!                 println!("beat");
//!                 Ok(())
//!             })
//!         }))?;
//!     engine.submit(task).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     engine.shutdown(tickflow::ShutdownMode::Graceful).await;
//!     Ok(())
//! }
//! ```

use anyhow::Context;
use tracing::{debug, info};

pub use tickflow_core::{
    init_logging, ConfigValidator, DispatcherConfig, EngineConfig, LogFormat, LoggingConfig,
    PoolMode, SchedulerError, SchedulerResult, WorkerPoolConfig,
};
pub use tickflow_dispatcher::{
    global_engine, global_engine_with, Dispatcher, PoolSizing, SchedulerEngine, TokioWorkerPool,
    WorkQueue, WorkerPool,
};
pub use tickflow_domain::{
    compute_fn, Computable, OverflowListener, Payload, ShutdownMode, TaskEventListener,
    TerminalState, TimerTask, TimerTaskBuilder,
};

/// 一步完成配置加载、日志初始化和引擎启动。
///
/// `config_path` 为 None 时走默认查找路径和环境变量。日志初始化失败
/// （通常是进程里已经装过订阅器）不视为错误。
pub async fn bootstrap(config_path: Option<&str>) -> anyhow::Result<SchedulerEngine> {
    let config = EngineConfig::load(config_path).context("加载调度引擎配置失败")?;
    if let Err(e) = tickflow_core::init_logging(&config.logging) {
        debug!("日志订阅器已存在，沿用当前配置: {}", e);
    }

    let engine = SchedulerEngine::new(config).context("构建调度引擎失败")?;
    engine.start().await;
    info!("调度引擎启动完成");
    Ok(engine)
}
