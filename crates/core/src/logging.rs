use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::{SchedulerError, SchedulerResult};

/// 根据配置初始化全局 tracing 订阅器。
///
/// RUST_LOG 环境变量优先于配置文件中的级别。重复初始化返回错误，
/// 调用方（例如测试）可以忽略该错误继续运行。
pub fn init_logging(config: &LoggingConfig) -> SchedulerResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };

    result.map_err(|e| SchedulerError::Configuration(format!("初始化日志失败: {e}")))
}
