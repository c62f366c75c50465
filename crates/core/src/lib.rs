//! 调度引擎的基础设施：错误类型、配置模型与日志初始化。

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{
    ConfigValidator, DispatcherConfig, EngineConfig, LogFormat, LoggingConfig, PoolMode,
    WorkerPoolConfig,
};
pub use errors::{SchedulerError, SchedulerResult};
pub use logging::init_logging;
