use std::path::Path;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::errors::{SchedulerError, SchedulerResult};

/// 配置校验接口，每个配置段独立实现
pub trait ConfigValidator {
    fn validate(&self) -> SchedulerResult<()>;
}

/// 调度循环配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// 每轮评估之间的休眠时间（毫秒）
    pub round_interval_ms: u64,
    /// 任务队列容量，None 表示不限长
    pub queue_capacity: Option<usize>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            round_interval_ms: 1000,
            queue_capacity: None,
        }
    }
}

impl ConfigValidator for DispatcherConfig {
    fn validate(&self) -> SchedulerResult<()> {
        if self.round_interval_ms == 0 {
            return Err(SchedulerError::Configuration(
                "dispatcher.round_interval_ms 必须大于0".to_string(),
            ));
        }
        if let Some(capacity) = self.queue_capacity {
            if capacity == 0 {
                return Err(SchedulerError::InvalidCapacity);
            }
        }
        Ok(())
    }
}

/// 工作池的弹性策略
///
/// - `cached`: 按需扩容，无上限
/// - `fixed`: 固定并发数 `size`
/// - `bounded`: `min_size`/`max_size` 区间加空闲保活时间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolMode {
    Cached,
    Fixed,
    Bounded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    pub mode: PoolMode,
    pub size: usize,
    pub min_size: usize,
    pub max_size: usize,
    pub keep_alive_ms: u64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            mode: PoolMode::Cached,
            size: 4,
            min_size: 1,
            max_size: 16,
            keep_alive_ms: 60_000,
        }
    }
}

impl ConfigValidator for WorkerPoolConfig {
    fn validate(&self) -> SchedulerResult<()> {
        match self.mode {
            PoolMode::Cached => {}
            PoolMode::Fixed => {
                if self.size == 0 {
                    return Err(SchedulerError::Configuration(
                        "worker_pool.size 必须大于0".to_string(),
                    ));
                }
            }
            PoolMode::Bounded => {
                if self.max_size == 0 {
                    return Err(SchedulerError::Configuration(
                        "worker_pool.max_size 必须大于0".to_string(),
                    ));
                }
                if self.min_size > self.max_size {
                    return Err(SchedulerError::Configuration(format!(
                        "worker_pool.min_size ({}) 不能大于 max_size ({})",
                        self.min_size, self.max_size
                    )));
                }
            }
        }
        Ok(())
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Text,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl ConfigValidator for LoggingConfig {
    fn validate(&self) -> SchedulerResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.to_lowercase().as_str()) {
            return Err(SchedulerError::Configuration(format!(
                "无效的日志级别: {}，可选值: {:?}",
                self.level, valid_levels
            )));
        }
        Ok(())
    }
}

/// 引擎顶层配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub worker_pool: WorkerPoolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// 加载配置：优先使用指定路径，其次查找默认路径，最后落到内置默认值。
    /// 环境变量（TICKFLOW__ 前缀，双下划线分段）覆盖文件配置。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = ["config/tickflow.toml", "tickflow.toml"];
            for path in &default_paths {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("TICKFLOW")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build().context("构建配置失败")?;
        let config: EngineConfig = settings
            .try_deserialize()
            .context("反序列化配置失败")?;

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("配置校验失败: {}", e))?;

        Ok(config)
    }
}

impl ConfigValidator for EngineConfig {
    fn validate(&self) -> SchedulerResult<()> {
        self.dispatcher.validate()?;
        self.worker_pool.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
