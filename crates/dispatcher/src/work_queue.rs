use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock};
use tracing::debug;

use tickflow_core::{SchedulerError, SchedulerResult};
use tickflow_domain::OverflowListener;

/// 线程安全的双端任务队列
///
/// 既是生产者到调度器的缓冲通道，也是调度器每轮轮转用的环形缓冲：
/// 插入走队头（push_front），消费走队尾（pop_back），存活任务重新
/// 插回队头，整体表现为稳定的轮转 FIFO。
///
/// 可选固定容量：容量满时先淘汰队尾（最老的元素），同步通知所有
/// 溢出监听器，然后再插入新元素。
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
    capacity: Option<usize>,
    overflow_listeners: RwLock<Vec<Arc<dyn OverflowListener<T>>>>,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    /// 创建不限长队列
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            capacity: None,
            overflow_listeners: RwLock::new(Vec::new()),
        }
    }

    /// 创建固定容量队列，容量必须大于0
    pub fn with_capacity(capacity: usize) -> SchedulerResult<Self> {
        if capacity == 0 {
            return Err(SchedulerError::InvalidCapacity);
        }
        Ok(Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity: Some(capacity),
            overflow_listeners: RwLock::new(Vec::new()),
        })
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// 从队尾取出最老的元素，队列为空时返回 None
    pub async fn pop_back(&self) -> Option<T> {
        self.items.lock().await.pop_back()
    }

    /// 等待直到被 signal/signal_all 唤醒
    ///
    /// 可能被虚假唤醒，调用方必须在醒来后重新检查自己的条件。
    pub async fn wait(&self) {
        self.notify.notified().await;
    }

    /// 带超时的等待，被唤醒返回 true，超时返回 false
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.notify.notified())
            .await
            .is_ok()
    }

    /// 唤醒一个等待者。没有等待者时保留一次唤醒许可，
    /// 保证检查队列和进入等待之间到达的信号不会丢失。
    pub fn signal(&self) {
        self.notify.notify_one();
    }

    /// 唤醒所有等待者，并保留一次许可给尚未进入等待的消费者
    pub fn signal_all(&self) {
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    pub async fn add_overflow_listener(&self, listener: Arc<dyn OverflowListener<T>>) {
        self.overflow_listeners.write().await.push(listener);
    }

    /// 按身份（Arc 指针）移除监听器，存在并移除时返回 true
    pub async fn remove_overflow_listener(&self, listener: &Arc<dyn OverflowListener<T>>) -> bool {
        let mut listeners = self.overflow_listeners.write().await;
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }
}

impl<T: Clone> WorkQueue<T> {
    /// 插入到队头。固定容量且已满时先淘汰队尾并通知溢出监听器。
    pub async fn push_front(&self, item: T) {
        let mut items = self.items.lock().await;
        self.evict_if_full(&mut items).await;
        items.push_front(item);
    }

    /// 追加到队尾，淘汰逻辑与 push_front 相同
    pub async fn push_back(&self, item: T) {
        let mut items = self.items.lock().await;
        self.evict_if_full(&mut items).await;
        items.push_back(item);
    }

    pub async fn peek_front(&self) -> Option<T> {
        self.items.lock().await.front().cloned()
    }

    pub async fn peek_back(&self) -> Option<T> {
        self.items.lock().await.back().cloned()
    }

    async fn evict_if_full(&self, items: &mut VecDeque<T>) {
        let Some(capacity) = self.capacity else {
            return;
        };
        if items.len() < capacity {
            return;
        }
        if let Some(evicted) = items.pop_back() {
            debug!("队列容量已满({}), 淘汰最老的元素", capacity);
            let listeners = self.overflow_listeners.read().await;
            for listener in listeners.iter() {
                listener.on_item_evicted(evicted.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rotating_fifo_order() {
        let queue = WorkQueue::new();
        queue.push_front(1).await;
        queue.push_front(2).await;
        queue.push_front(3).await;

        // 队头插入、队尾消费 = 提交顺序
        assert_eq!(queue.pop_back().await, Some(1));
        assert_eq!(queue.pop_back().await, Some(2));
        assert_eq!(queue.pop_back().await, Some(3));
        assert_eq!(queue.pop_back().await, None);
    }

    #[tokio::test]
    async fn test_reinsert_keeps_round_order() {
        let queue = WorkQueue::new();
        for i in 1..=3 {
            queue.push_front(i).await;
        }
        // 模拟一轮轮转：逐个取出再插回队头
        let size = queue.len().await;
        let mut seen = Vec::new();
        for _ in 0..size {
            let item = queue.pop_back().await.unwrap();
            seen.push(item);
            queue.push_front(item).await;
        }
        assert_eq!(seen, vec![1, 2, 3]);
        // 下一轮顺序不变
        let mut second = Vec::new();
        for _ in 0..size {
            let item = queue.pop_back().await.unwrap();
            second.push(item);
            queue.push_front(item).await;
        }
        assert_eq!(second, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_zero_capacity_rejected() {
        assert!(WorkQueue::<u32>::with_capacity(0).is_err());
    }

    #[tokio::test]
    async fn test_peek_does_not_consume() {
        let queue = WorkQueue::new();
        queue.push_front("a").await;
        queue.push_front("b").await;
        assert_eq!(queue.peek_back().await, Some("a"));
        assert_eq!(queue.peek_front().await, Some("b"));
        assert_eq!(queue.len().await, 2);
    }
}
