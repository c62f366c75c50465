use std::sync::Arc;
use std::time::Duration;

use tickflow_dispatcher::{PoolSizing, TokioWorkerPool, WorkerPool};
use tickflow_domain::TimerTask;
use tickflow_testing_utils::{wait_until, CountingWork, GaugeWork};

#[tokio::test]
async fn test_cached_pool_runs_everything_concurrently() {
    let pool = TokioWorkerPool::new(PoolSizing::Cached);
    let work = GaugeWork::new(Duration::from_millis(50));

    for i in 0..8 {
        let task = TimerTask::builder(format!("burst-{}", i))
            .build(work.clone())
            .unwrap();
        pool.submit(task).await.unwrap();
    }

    assert!(wait_until(Duration::from_secs(2), || work.completed() == 8).await);
    // 无上限的池应该让它们重叠执行
    assert!(work.max_seen() > 1, "max_seen={}", work.max_seen());
}

#[tokio::test]
async fn test_fixed_pool_bounds_concurrency() {
    let pool = TokioWorkerPool::new(PoolSizing::Fixed(2));
    let work = GaugeWork::new(Duration::from_millis(50));

    for i in 0..6 {
        let task = TimerTask::builder(format!("bounded-{}", i))
            .build(work.clone())
            .unwrap();
        pool.submit(task).await.unwrap();
    }

    // 全部最终完成，但同时在跑的不超过信号量许可数
    assert!(wait_until(Duration::from_secs(3), || work.completed() == 6).await);
    assert!(work.max_seen() <= 2, "max_seen={}", work.max_seen());
}

#[tokio::test]
async fn test_bounded_pool_uses_max_as_limit() {
    let pool = TokioWorkerPool::new(PoolSizing::Bounded {
        min: 1,
        max: 3,
        keep_alive_ms: 60_000,
    });
    let work = GaugeWork::new(Duration::from_millis(50));

    for i in 0..9 {
        let task = TimerTask::builder(format!("elastic-{}", i))
            .build(work.clone())
            .unwrap();
        pool.submit(task).await.unwrap();
    }

    assert!(wait_until(Duration::from_secs(3), || work.completed() == 9).await);
    assert!(work.max_seen() <= 3, "max_seen={}", work.max_seen());
}

#[tokio::test]
async fn test_submit_after_shutdown_is_rejected() {
    let pool = TokioWorkerPool::new(PoolSizing::Fixed(1));
    pool.shutdown().await;
    assert!(pool.is_shutdown());

    let task = TimerTask::builder("late")
        .build(CountingWork::new())
        .unwrap();
    assert!(pool.submit(task).await.is_err());
}

#[tokio::test]
async fn test_shutdown_drops_queued_but_not_started_work() {
    let pool = TokioWorkerPool::new(PoolSizing::Fixed(1));
    let slow = GaugeWork::new(Duration::from_millis(200));
    let queued = CountingWork::new();

    let slow_task = TimerTask::builder("head").build(slow.clone()).unwrap();
    let queued_task = TimerTask::builder("tail").build(queued.clone()).unwrap();

    pool.submit(slow_task).await.unwrap();
    // 等第一个任务真正占住唯一的许可
    assert!(wait_until(Duration::from_secs(1), || slow.max_seen() == 1).await);
    pool.submit(queued_task).await.unwrap();

    pool.shutdown().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    // 排队中的执行被丢弃，已开始的不受影响
    assert_eq!(queued.count(), 0);
    assert_eq!(slow.completed(), 1);
}
