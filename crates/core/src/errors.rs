use thiserror::Error;

/// 调度引擎错误类型定义
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("无效的时间间隔: {0} ms")]
    InvalidInterval(i64),

    #[error("无效的重复次数: {0}")]
    InvalidRepeatCount(i64),

    #[error("任务名称不能为空")]
    EmptyTaskName,

    #[error("监听器类别不能为空")]
    EmptyListenerKind,

    #[error("队列容量必须大于0")]
    InvalidCapacity,

    #[error("工作池已关闭，拒绝新任务")]
    PoolShutdown,

    #[error("调度器已关闭")]
    DispatcherShutdown,

    #[error("任务执行错误: {0}")]
    TaskExecution(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
