use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tickflow_core::{SchedulerError, SchedulerResult};
use tickflow_domain::{Computable, OverflowListener, TaskEventListener, TerminalState, TimerTask};

/// 计数型任务体，可选延迟和固定失败
pub struct CountingWork {
    count: AtomicU64,
    delay: Option<Duration>,
    fail: bool,
}

impl CountingWork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            count: AtomicU64::new(0),
            delay: None,
            fail: false,
        })
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            count: AtomicU64::new(0),
            delay: Some(delay),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            count: AtomicU64::new(0),
            delay: None,
            fail: true,
        })
    }

    /// 已开始的执行次数（进入 compute 即计数）
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Computable for CountingWork {
    async fn compute(&self) -> SchedulerResult<()> {
        self.count.fetch_add(1, Ordering::AcqRel);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SchedulerError::TaskExecution("mock failure".to_string()));
        }
        Ok(())
    }
}

/// 记录执行顺序的任务体，多个实例共享同一个序列
pub struct OrderRecordingWork {
    label: String,
    order: Arc<Mutex<Vec<String>>>,
}

impl OrderRecordingWork {
    pub fn shared_order() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn new(label: impl Into<String>, order: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            order,
        })
    }
}

#[async_trait]
impl Computable for OrderRecordingWork {
    async fn compute(&self) -> SchedulerResult<()> {
        self.order
            .lock()
            .expect("order mutex poisoned")
            .push(self.label.clone());
        Ok(())
    }
}

/// 跟踪并发执行峰值的任务体
pub struct GaugeWork {
    current: AtomicUsize,
    max_seen: AtomicUsize,
    completed: AtomicUsize,
    hold: Duration,
}

impl GaugeWork {
    pub fn new(hold: Duration) -> Arc<Self> {
        Arc::new(Self {
            current: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            hold,
        })
    }

    pub fn max_seen(&self) -> usize {
        self.max_seen.load(Ordering::Acquire)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Computable for GaugeWork {
    async fn compute(&self) -> SchedulerResult<()> {
        let now = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_seen.fetch_max(now, Ordering::AcqRel);
        tokio::time::sleep(self.hold).await;
        self.current.fetch_sub(1, Ordering::AcqRel);
        self.completed.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

/// 记录终止事件的监听器
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<(String, TerminalState)>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(String, TerminalState)> {
        self.events.lock().expect("events mutex poisoned").clone()
    }

    pub fn count_for(&self, name: &str, state: TerminalState) -> usize {
        self.events()
            .iter()
            .filter(|(n, s)| n == name && *s == state)
            .count()
    }

    fn record(&self, task: &TimerTask, state: TerminalState) {
        self.events
            .lock()
            .expect("events mutex poisoned")
            .push((task.name().to_string(), state));
    }
}

#[async_trait]
impl TaskEventListener for RecordingListener {
    async fn on_cancel(&self, task: Arc<TimerTask>) {
        self.record(&task, TerminalState::Cancelled);
    }

    async fn on_expire(&self, task: Arc<TimerTask>) {
        self.record(&task, TerminalState::Expired);
    }

    async fn on_finish(&self, task: Arc<TimerTask>) {
        self.record(&task, TerminalState::Finished);
    }
}

/// 收集被淘汰元素的溢出监听器
pub struct CollectingOverflowListener<T> {
    evicted: Mutex<Vec<T>>,
}

impl<T: Clone + Send> CollectingOverflowListener<T> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            evicted: Mutex::new(Vec::new()),
        })
    }

    pub fn evicted(&self) -> Vec<T> {
        self.evicted.lock().expect("evicted mutex poisoned").clone()
    }
}

impl<T: Clone + Send + Sync> OverflowListener<T> for CollectingOverflowListener<T> {
    fn on_item_evicted(&self, item: T) {
        self.evicted
            .lock()
            .expect("evicted mutex poisoned")
            .push(item);
    }
}
