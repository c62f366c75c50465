use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tickflow_dispatcher::WorkQueue;
use tickflow_domain::OverflowListener;
use tickflow_testing_utils::{wait_until, CollectingOverflowListener};

#[tokio::test]
async fn test_fifo_consumption_order() {
    let queue = WorkQueue::new();
    for i in 1..=5 {
        queue.push_front(i).await;
    }
    let mut drained = Vec::new();
    while let Some(item) = queue.pop_back().await {
        drained.push(item);
    }
    assert_eq!(drained, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_fixed_capacity_evicts_exactly_the_oldest() {
    let queue: WorkQueue<u32> = WorkQueue::with_capacity(3).unwrap();
    let listener = CollectingOverflowListener::new();
    queue
        .add_overflow_listener(listener.clone() as Arc<dyn OverflowListener<u32>>)
        .await;

    // C+1 次插入只淘汰一个元素，且是最老的那个
    for i in 1..=4 {
        queue.push_front(i).await;
    }
    assert_eq!(queue.len().await, 3);
    assert_eq!(listener.evicted(), vec![1u32]);

    assert_eq!(queue.pop_back().await, Some(2));
    assert_eq!(queue.pop_back().await, Some(3));
    assert_eq!(queue.pop_back().await, Some(4));
}

#[tokio::test]
async fn test_push_back_also_honors_capacity() {
    let queue: WorkQueue<u32> = WorkQueue::with_capacity(2).unwrap();
    let listener = CollectingOverflowListener::new();
    queue
        .add_overflow_listener(listener.clone() as Arc<dyn OverflowListener<u32>>)
        .await;

    queue.push_back(1).await;
    queue.push_back(2).await;
    queue.push_back(3).await;
    assert_eq!(queue.len().await, 2);
    assert_eq!(listener.evicted().len(), 1);
}

#[tokio::test]
async fn test_remove_overflow_listener_by_identity() {
    let queue: WorkQueue<u32> = WorkQueue::with_capacity(1).unwrap();
    let listener = CollectingOverflowListener::new();
    let as_dyn = listener.clone() as Arc<dyn OverflowListener<u32>>;
    queue.add_overflow_listener(as_dyn.clone()).await;

    assert!(queue.remove_overflow_listener(&as_dyn).await);
    assert!(!queue.remove_overflow_listener(&as_dyn).await);

    queue.push_front(1).await;
    queue.push_front(2).await;
    assert!(listener.evicted().is_empty());
}

#[tokio::test]
async fn test_signal_wakes_waiting_consumer() {
    let queue: Arc<WorkQueue<u32>> = Arc::new(WorkQueue::new());
    let woke = Arc::new(AtomicBool::new(false));

    let waiter_queue = Arc::clone(&queue);
    let waiter_woke = Arc::clone(&woke);
    let waiter = tokio::spawn(async move {
        waiter_queue.wait().await;
        waiter_woke.store(true, Ordering::Release);
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!woke.load(Ordering::Acquire));

    queue.signal();
    assert!(wait_until(Duration::from_secs(1), || woke.load(Ordering::Acquire)).await);
    waiter.await.unwrap();
}

#[tokio::test]
async fn test_signal_before_wait_is_not_lost() {
    let queue: WorkQueue<u32> = WorkQueue::new();
    // 先到的信号保留为一次唤醒许可
    queue.signal();
    assert!(queue.wait_timeout(Duration::from_millis(200)).await);
}

#[tokio::test]
async fn test_wait_timeout_expires() {
    let queue: WorkQueue<u32> = WorkQueue::new();
    assert!(!queue.wait_timeout(Duration::from_millis(50)).await);
}

#[tokio::test]
async fn test_signal_all_wakes_everyone() {
    let queue: Arc<WorkQueue<u32>> = Arc::new(WorkQueue::new());
    let mut waiters = Vec::new();
    for _ in 0..3 {
        let q = Arc::clone(&queue);
        waiters.push(tokio::spawn(async move {
            q.wait().await;
        }));
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    queue.signal_all();
    for waiter in waiters {
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter was not woken")
            .unwrap();
    }
}
