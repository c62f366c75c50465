use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use tickflow_core::{PoolMode, SchedulerError, SchedulerResult, WorkerPoolConfig};
use tickflow_domain::TimerTask;

/// 任务执行池：submit 之后任务体在后台异步执行。
/// 调度器只依赖这一个抽象，不关心池的弹性策略。
#[async_trait]
pub trait WorkerPool: Send + Sync {
    async fn submit(&self, task: Arc<TimerTask>) -> SchedulerResult<()>;

    /// 拒绝后续提交并丢弃尚未开始的排队执行。
    /// 已开始的任务体不会被打断。幂等。
    async fn shutdown(&self);
}

/// 池的弹性策略，对应配置里的 cached/fixed/bounded 三种模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSizing {
    /// 按需扩容，无并发上限
    Cached,
    /// 固定并发数
    Fixed(usize),
    /// min/max 区间加空闲保活时间
    Bounded {
        min: usize,
        max: usize,
        keep_alive_ms: u64,
    },
}

impl PoolSizing {
    pub fn from_config(config: &WorkerPoolConfig) -> Self {
        match config.mode {
            PoolMode::Cached => PoolSizing::Cached,
            PoolMode::Fixed => PoolSizing::Fixed(config.size),
            PoolMode::Bounded => PoolSizing::Bounded {
                min: config.min_size,
                max: config.max_size,
                keep_alive_ms: config.keep_alive_ms,
            },
        }
    }
}

/// 基于 tokio 的工作池实现
///
/// Cached 直接 spawn；Fixed/Bounded 用信号量限制同时执行的任务体
/// 数量，超出的执行在信号量上排队，不会阻塞调度循环。
pub struct TokioWorkerPool {
    sizing: PoolSizing,
    semaphore: Option<Arc<Semaphore>>,
    shutdown: AtomicBool,
}

impl TokioWorkerPool {
    pub fn new(sizing: PoolSizing) -> Self {
        let semaphore = match sizing {
            PoolSizing::Cached => None,
            PoolSizing::Fixed(size) => Some(Arc::new(Semaphore::new(size))),
            PoolSizing::Bounded {
                min,
                max,
                keep_alive_ms,
            } => {
                // tokio 运行时下线程保活由运行时管理，这里的并发上限取 max
                info!(
                    "创建有界工作池: min={}, max={}, keep_alive={}ms",
                    min, max, keep_alive_ms
                );
                Some(Arc::new(Semaphore::new(max)))
            }
        };
        Self {
            sizing,
            semaphore,
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &WorkerPoolConfig) -> Self {
        Self::new(PoolSizing::from_config(config))
    }

    pub fn sizing(&self) -> PoolSizing {
        self.sizing
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

#[async_trait]
impl WorkerPool for TokioWorkerPool {
    async fn submit(&self, task: Arc<TimerTask>) -> SchedulerResult<()> {
        if self.is_shutdown() {
            return Err(SchedulerError::PoolShutdown);
        }
        let semaphore = self.semaphore.clone();
        tokio::spawn(async move {
            // 许可在执行体内部获取：池满时这里排队，调度循环不受影响
            let _permit = match semaphore {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        debug!("工作池已关闭，丢弃排队中的任务: {}", task.name());
                        return;
                    }
                },
                None => None,
            };
            task.execute().await;
        });
        Ok(())
    }

    async fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(semaphore) = &self.semaphore {
            semaphore.close();
        }
        info!("工作池已关闭");
    }
}
