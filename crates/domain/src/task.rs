use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::error;

use tickflow_core::{SchedulerError, SchedulerResult};

use crate::value_objects::TerminalState;

/// 任务业务逻辑接口，真正的计算写在这里
#[async_trait]
pub trait Computable: Send + Sync {
    async fn compute(&self) -> SchedulerResult<()>;
}

struct FnComputable<F> {
    f: F,
}

#[async_trait]
impl<F> Computable for FnComputable<F>
where
    F: Fn() -> BoxFuture<'static, SchedulerResult<()>> + Send + Sync,
{
    async fn compute(&self) -> SchedulerResult<()> {
        (self.f)().await
    }
}

/// 把闭包包装成 [`Computable`]，方便不想定义新类型的调用方
pub fn compute_fn<F>(f: F) -> Arc<dyn Computable>
where
    F: Fn() -> BoxFuture<'static, SchedulerResult<()>> + Send + Sync + 'static,
{
    Arc::new(FnComputable { f })
}

/// 可调度的任务描述符
///
/// 执行策略（周期、重复次数、守护标志等）在构建时固定；
/// 调度簿记字段（执行次数、时间戳）只由调度器写入；
/// 终止标志和立即执行标志可以由任意线程通过原子写设置。
/// 任务以 `Arc<TimerTask>` 共享，生产者保留一份句柄即可随时取消。
pub struct TimerTask {
    name: String,
    kind: String,
    payload: Value,
    period_ms: i64,
    periodic: bool,
    daemon: bool,
    single_executable: bool,
    repeat_count: u64,

    exec_count: AtomicU64,
    next_execution_at: AtomicI64,
    prev_execution_at: AtomicI64,

    cancelled: AtomicBool,
    finished: AtomicBool,
    expired: AtomicBool,
    execute_immediately: AtomicBool,
    running: AtomicBool,

    work: Arc<dyn Computable>,
}

impl TimerTask {
    pub fn builder(name: impl Into<String>) -> TimerTaskBuilder {
        TimerTaskBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 监听器按该类别接收终止事件
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn period_ms(&self) -> i64 {
        self.period_ms
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    pub fn is_daemon(&self) -> bool {
        self.daemon
    }

    pub fn is_single_executable(&self) -> bool {
        self.single_executable
    }

    pub fn repeat_count(&self) -> u64 {
        self.repeat_count
    }

    pub fn exec_count(&self) -> u64 {
        self.exec_count.load(Ordering::Acquire)
    }

    pub fn next_execution_at(&self) -> i64 {
        self.next_execution_at.load(Ordering::Acquire)
    }

    pub fn prev_execution_at(&self) -> i64 {
        self.prev_execution_at.load(Ordering::Acquire)
    }

    /// 剩余执行次数。守护任务永远返回1，只能通过取消移除。
    pub fn remaining(&self) -> i64 {
        if self.daemon {
            return 1;
        }
        self.repeat_count as i64 - self.exec_count() as i64
    }

    /// 距离上次执行的毫秒数，从未执行过时返回0
    pub fn elapsed_ms(&self) -> i64 {
        let prev = self.prev_execution_at();
        if prev == 0 {
            return 0;
        }
        Utc::now().timestamp_millis() - prev
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn set_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn set_expired(&self) {
        self.expired.store(true, Ordering::Release);
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    /// 终止状态判定，检查顺序：取消、完成、过期
    pub fn terminal_state(&self) -> Option<TerminalState> {
        if self.is_cancelled() {
            Some(TerminalState::Cancelled)
        } else if self.is_finished() {
            Some(TerminalState::Finished)
        } else if self.is_expired() {
            Some(TerminalState::Expired)
        } else {
            None
        }
    }

    /// 请求在下一轮立即执行，不等周期到期。
    /// 只是请求，实际执行仍要等调度器的下一轮评估。
    pub fn request_immediate(&self) {
        self.execute_immediately.store(true, Ordering::Release);
    }

    pub fn is_immediate_set(&self) -> bool {
        self.execute_immediately.load(Ordering::Acquire)
    }

    /// 原子地读取并清除立即执行标志
    pub fn take_immediate(&self) -> bool {
        self.execute_immediately.swap(false, Ordering::AcqRel)
    }

    /// 只有 single_executable 的任务才记录 running 状态。
    /// 默认策略允许同一任务的执行体重叠，与原始行为保持一致。
    pub fn set_running(&self, running: bool) {
        if self.single_executable {
            self.running.store(running, Ordering::Release);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 记录一次执行：次数加一，next = now + period，prev = now。
    /// 只允许调度器调用。
    pub fn record_execution(&self, now_ms: i64) {
        self.exec_count.fetch_add(1, Ordering::AcqRel);
        self.next_execution_at
            .store(now_ms + self.period_ms, Ordering::Release);
        self.prev_execution_at.store(now_ms, Ordering::Release);
    }

    /// 按 next_execution_at 升序比较两个任务
    pub fn cmp_by_next_execution(&self, other: &TimerTask) -> std::cmp::Ordering {
        self.next_execution_at().cmp(&other.next_execution_at())
    }

    /// 工作池侧的执行包装：维护 running 标志，捕获并记录任务体错误。
    /// 任务体失败不会进入终止状态，周期任务下个周期照常重试。
    pub async fn execute(&self) {
        self.set_running(true);
        if let Err(e) = self.work.compute().await {
            error!("任务 {} 执行出错: {}", self.name, e);
        }
        self.set_running(false);
    }
}

impl fmt::Display for TimerTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TimerTask [name={}, kind={}, daemon={}",
            self.name, self.kind, self.daemon
        )?;
        if self.periodic {
            write!(f, ", periodic=true, period={}ms", self.period_ms)?;
        }
        write!(
            f,
            ", repeat={}, exec={}, next={}, prev={}, finished={}, cancelled={}, expired={}, singleExecutable={}, running={}]",
            self.repeat_count,
            self.exec_count(),
            self.next_execution_at(),
            self.prev_execution_at(),
            self.is_finished(),
            self.is_cancelled(),
            self.is_expired(),
            self.single_executable,
            self.is_running(),
        )
    }
}

/// [`TimerTask`] 的构建器，策略字段在 build 时一次性校验
pub struct TimerTaskBuilder {
    name: String,
    kind: Option<String>,
    payload: Value,
    period: Option<Duration>,
    daemon: bool,
    repeat_count: u64,
    single_executable: bool,
}

impl TimerTaskBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            payload: Value::Null,
            period: None,
            daemon: false,
            repeat_count: 1,
            single_executable: false,
        }
    }

    /// 监听器类别，缺省时使用任务名
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// 设置重复间隔，同时把任务标记为周期性
    pub fn period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }

    pub fn daemon(mut self, daemon: bool) -> Self {
        self.daemon = daemon;
        self
    }

    pub fn repeat(mut self, times: u64) -> Self {
        self.repeat_count = times;
        self
    }

    /// 同一时刻最多一个执行体在跑，执行期间到期的周期被跳过
    pub fn single_executable(mut self, single: bool) -> Self {
        self.single_executable = single;
        self
    }

    pub fn build(self, work: Arc<dyn Computable>) -> SchedulerResult<Arc<TimerTask>> {
        if self.name.trim().is_empty() {
            return Err(SchedulerError::EmptyTaskName);
        }
        if self.repeat_count == 0 {
            return Err(SchedulerError::InvalidRepeatCount(0));
        }
        let (period_ms, periodic) = match self.period {
            Some(period) => {
                let ms = period.as_millis() as i64;
                if ms <= 0 {
                    return Err(SchedulerError::InvalidInterval(ms));
                }
                (ms, true)
            }
            None => (0, false),
        };

        let kind = self.kind.unwrap_or_else(|| self.name.clone());

        Ok(Arc::new(TimerTask {
            name: self.name,
            kind,
            payload: self.payload,
            period_ms,
            periodic,
            daemon: self.daemon,
            single_executable: self.single_executable,
            repeat_count: self.repeat_count,
            exec_count: AtomicU64::new(0),
            next_execution_at: AtomicI64::new(0),
            prev_execution_at: AtomicI64::new(0),
            cancelled: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            expired: AtomicBool::new(false),
            execute_immediately: AtomicBool::new(false),
            running: AtomicBool::new(false),
            work,
        }))
    }
}
