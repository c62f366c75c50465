use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use tickflow_core::{SchedulerError, SchedulerResult};
use tickflow_domain::{ShutdownMode, TaskEventListener, TerminalState, TimerTask};

use crate::work_queue::WorkQueue;
use crate::worker_pool::WorkerPool;

/// 单线程调度循环
///
/// 唯一的调度决策者：从队列轮转任务、判定是否到期、把到期任务交给
/// 工作池并发执行、对终止任务触发监听器回调。任务的调度簿记字段只由
/// 这一个循环写入，因此不需要任务级别的锁。
pub struct Dispatcher {
    name: String,
    queue: Arc<WorkQueue<Arc<TimerTask>>>,
    listeners: RwLock<HashMap<String, Arc<dyn TaskEventListener>>>,
    pool: Arc<dyn WorkerPool>,
    interval_ms: AtomicU64,
    running: RwLock<bool>,
    shutdown_done: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new(
        name: impl Into<String>,
        queue: Arc<WorkQueue<Arc<TimerTask>>>,
        pool: Arc<dyn WorkerPool>,
        interval_ms: u64,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            name: name.into(),
            queue,
            listeners: RwLock::new(HashMap::new()),
            pool,
            interval_ms: AtomicU64::new(interval_ms),
            running: RwLock::new(false),
            shutdown_done: AtomicBool::new(false),
            shutdown_tx,
            loop_handle: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queue(&self) -> &Arc<WorkQueue<Arc<TimerTask>>> {
        &self.queue
    }

    /// 每轮评估之间的休眠时间（毫秒）
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms.load(Ordering::Relaxed)
    }

    pub fn set_interval_ms(&self, interval_ms: u64) {
        self.interval_ms.store(interval_ms, Ordering::Relaxed);
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// 启动调度循环，重复调用是无操作
    pub async fn start(self: &Arc<Self>) {
        {
            let mut running = self.running.write().await;
            if *running {
                debug!("调度器 {} 已在运行，忽略重复启动", self.name);
                return;
            }
            *running = true;
        }
        let dispatcher = Arc::clone(self);
        let handle = tokio::spawn(async move {
            dispatcher.run_loop().await;
        });
        *self.loop_handle.lock().await = Some(handle);
        info!("调度器 {} 已启动", self.name);
    }

    /// 提交任务参与调度，任何线程（包括工作池的执行体）都可以调用
    pub async fn submit(&self, task: Arc<TimerTask>) -> SchedulerResult<()> {
        if self.shutdown_done.load(Ordering::Acquire) {
            return Err(SchedulerError::DispatcherShutdown);
        }
        info!("收到新任务: {}", task);
        self.queue.push_front(task).await;
        self.queue.signal_all();
        Ok(())
    }

    /// 注册某一类别的终止事件监听器，每个类别最多一个。
    /// 返回 true 表示替换了已有的注册。
    pub async fn register_listener(
        &self,
        kind: &str,
        listener: Arc<dyn TaskEventListener>,
    ) -> SchedulerResult<bool> {
        if kind.trim().is_empty() {
            return Err(SchedulerError::EmptyListenerKind);
        }
        let mut listeners = self.listeners.write().await;
        Ok(listeners.insert(kind.to_string(), listener).is_some())
    }

    /// 取消注册，存在并移除时返回 true
    pub async fn unregister_listener(&self, kind: &str) -> bool {
        self.listeners.write().await.remove(kind).is_some()
    }

    /// 停止调度循环和工作池，幂等。
    /// Graceful 等循环退出后返回；Forced 直接中止循环。
    pub async fn shutdown(&self, mode: ShutdownMode) {
        {
            let mut running = self.running.write().await;
            if !*running && self.shutdown_done.load(Ordering::Acquire) {
                return;
            }
            *running = false;
        }
        self.shutdown_done.store(true, Ordering::Release);
        info!("收到停止请求，等待调度器 {} 完成收尾", self.name);

        let _ = self.shutdown_tx.send(());
        self.queue.signal_all();
        self.pool.shutdown().await;

        if let Some(handle) = self.loop_handle.lock().await.take() {
            match mode {
                ShutdownMode::Graceful => {
                    if let Err(e) = handle.await {
                        error!("等待调度循环退出时出错: {}", e);
                    }
                }
                ShutdownMode::Forced => {
                    handle.abort();
                }
            }
        }
        info!("调度器 {} 已停止", self.name);
    }

    async fn run_loop(self: Arc<Self>) {
        info!("调度循环 {} 开始处理", self.name);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            if !self.is_running().await {
                break;
            }

            if self.queue.is_empty().await {
                debug!("没有待处理的任务，进入等待");
                tokio::select! {
                    _ = self.queue.wait() => {}
                    _ = shutdown_rx.recv() => {}
                }
            }

            if !self.is_running().await {
                break;
            }

            // 轮开始前对队列长度快照：本轮内重新插回的任务不会被重复评估
            let size = self.queue.len().await;
            debug!("本轮待评估任务数: {}", size);
            for _ in 0..size {
                let Some(task) = self.queue.pop_back().await else {
                    break;
                };
                if let Err(e) = self.evaluate(task).await {
                    error!("评估任务时出错，继续处理本轮剩余任务: {}", e);
                }
            }

            let interval = Duration::from_millis(self.interval_ms());
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown_rx.recv() => {}
            }
        }
        info!("调度循环 {} 退出", self.name);
    }

    /// 对单个任务应用一轮生命周期规则
    async fn evaluate(&self, task: Arc<TimerTask>) -> SchedulerResult<()> {
        if let Some(state) = task.terminal_state() {
            info!(
                "任务 {} 已处于 {} 状态，从队列移除并通知监听器",
                task.name(),
                state
            );
            self.fire_terminal_callback(task, state).await;
            return Ok(());
        }

        if task.remaining() > 0 {
            let mut eligible = false;
            if task.exec_count() == 0 {
                // 首次评估总是执行一次
                eligible = true;
            } else if task.is_periodic() && task.elapsed_ms() >= task.period_ms() {
                if task.is_single_executable() && task.is_running() {
                    warn!(
                        "任务 {} 的上一次执行尚未结束，本轮跳过避免重叠",
                        task.name()
                    );
                } else {
                    eligible = true;
                }
            } else if task.take_immediate() {
                debug!("任务 {} 请求了立即执行", task.name());
                eligible = true;
            }

            if eligible {
                debug!("提交任务执行: {}", task);
                task.record_execution(Utc::now().timestamp_millis());
                let submitted = self.pool.submit(Arc::clone(&task)).await;
                self.queue.push_front(task).await;
                submitted?;
            } else {
                self.queue.push_front(task).await;
            }
        } else {
            // 两步过期：本轮只打标记，下一轮走统一的终止回调路径，
            // 保证 on_expire 与取消/完成使用同一条通知代码
            task.set_expired();
            self.queue.push_front(task).await;
        }
        Ok(())
    }

    async fn fire_terminal_callback(&self, task: Arc<TimerTask>, state: TerminalState) {
        let listener = self.listeners.read().await.get(task.kind()).cloned();
        let Some(listener) = listener else {
            debug!("任务类别 {} 没有注册监听器", task.kind());
            return;
        };
        match state {
            TerminalState::Cancelled => listener.on_cancel(task).await,
            TerminalState::Finished => listener.on_finish(task).await,
            TerminalState::Expired => listener.on_expire(task).await,
        }
    }
}
