use std::sync::{Arc, OnceLock};

use tracing::info;

use tickflow_core::{ConfigValidator, EngineConfig, SchedulerResult};
use tickflow_domain::{ShutdownMode, TaskEventListener, TimerTask};

use crate::dispatcher::Dispatcher;
use crate::work_queue::WorkQueue;
use crate::worker_pool::{PoolSizing, TokioWorkerPool, WorkerPool};

/// 调度引擎组合根：队列 + 工作池 + 调度器
///
/// 推荐显式构建并按依赖注入传递。需要进程级共享实例时使用
/// [`global_engine`] / [`global_engine_with`]。
pub struct SchedulerEngine {
    dispatcher: Arc<Dispatcher>,
    queue: Arc<WorkQueue<Arc<TimerTask>>>,
    config: EngineConfig,
}

impl SchedulerEngine {
    pub fn new(config: EngineConfig) -> SchedulerResult<Self> {
        config.validate()?;

        let queue = match config.dispatcher.queue_capacity {
            Some(capacity) => Arc::new(WorkQueue::with_capacity(capacity)?),
            None => Arc::new(WorkQueue::new()),
        };
        let sizing = PoolSizing::from_config(&config.worker_pool);
        let pool: Arc<dyn WorkerPool> = Arc::new(TokioWorkerPool::new(sizing));
        let dispatcher = Arc::new(Dispatcher::new(
            "tickflow",
            Arc::clone(&queue),
            pool,
            config.dispatcher.round_interval_ms,
        ));

        info!("调度引擎已组装: pool={:?}", sizing);
        Ok(Self {
            dispatcher,
            queue,
            config,
        })
    }

    pub async fn start(&self) {
        self.dispatcher.start().await;
    }

    pub async fn submit(&self, task: Arc<TimerTask>) -> SchedulerResult<()> {
        self.dispatcher.submit(task).await
    }

    pub async fn register_listener(
        &self,
        kind: &str,
        listener: Arc<dyn TaskEventListener>,
    ) -> SchedulerResult<bool> {
        self.dispatcher.register_listener(kind, listener).await
    }

    pub async fn unregister_listener(&self, kind: &str) -> bool {
        self.dispatcher.unregister_listener(kind).await
    }

    pub async fn shutdown(&self, mode: ShutdownMode) {
        self.dispatcher.shutdown(mode).await;
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn queue(&self) -> &Arc<WorkQueue<Arc<TimerTask>>> {
        &self.queue
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

static GLOBAL_ENGINE: OnceLock<SchedulerEngine> = OnceLock::new();

/// 进程级单例引擎，首次调用时用给定配置构建。
/// 池的弹性策略在首次构建后即固定，后续调用的配置参数被忽略。
pub fn global_engine_with(config: EngineConfig) -> SchedulerResult<&'static SchedulerEngine> {
    if let Some(engine) = GLOBAL_ENGINE.get() {
        return Ok(engine);
    }
    let engine = SchedulerEngine::new(config)?;
    Ok(GLOBAL_ENGINE.get_or_init(|| engine))
}

/// 用默认配置获取进程级单例引擎
pub fn global_engine() -> SchedulerResult<&'static SchedulerEngine> {
    global_engine_with(EngineConfig::default())
}
