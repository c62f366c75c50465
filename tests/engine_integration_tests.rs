use std::sync::Arc;
use std::time::Duration;

use tickflow::{
    global_engine, DispatcherConfig, EngineConfig, OverflowListener, PoolMode, SchedulerEngine,
    ShutdownMode, TerminalState, TimerTask, WorkerPoolConfig,
};
use tickflow_testing_utils::{
    wait_until, CollectingOverflowListener, CountingWork, RecordingListener,
};

fn fast_config() -> EngineConfig {
    EngineConfig {
        dispatcher: DispatcherConfig {
            round_interval_ms: 25,
            queue_capacity: None,
        },
        worker_pool: WorkerPoolConfig {
            mode: PoolMode::Fixed,
            size: 4,
            ..WorkerPoolConfig::default()
        },
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_engine_end_to_end_lifecycle() {
    let engine = SchedulerEngine::new(fast_config()).unwrap();
    let listener = RecordingListener::new();
    engine
        .register_listener("report", listener.clone())
        .await
        .unwrap();

    let work = CountingWork::new();
    let task = TimerTask::builder("nightly-report")
        .kind("report")
        .period(Duration::from_millis(30))
        .repeat(2)
        .build(work.clone())
        .unwrap();

    engine.start().await;
    engine.submit(Arc::clone(&task)).await.unwrap();

    assert!(wait_until(Duration::from_secs(3), || work.count() == 2).await);
    assert!(
        wait_until(Duration::from_secs(2), || {
            listener.count_for("nightly-report", TerminalState::Expired) == 1
        })
        .await
    );
    assert!(engine.queue().is_empty().await);

    engine.shutdown(ShutdownMode::Graceful).await;
    assert!(engine.submit(task).await.is_err());
}

#[tokio::test]
async fn test_engine_cancellation_via_retained_handle() {
    let engine = SchedulerEngine::new(fast_config()).unwrap();
    let listener = RecordingListener::new();
    engine
        .register_listener("poller", listener.clone())
        .await
        .unwrap();

    let work = CountingWork::new();
    let task = TimerTask::builder("mailbox-poller")
        .kind("poller")
        .period(Duration::from_millis(25))
        .daemon(true)
        .build(work.clone())
        .unwrap();

    engine.start().await;
    engine.submit(Arc::clone(&task)).await.unwrap();
    assert!(wait_until(Duration::from_secs(2), || work.count() >= 1).await);

    task.cancel();
    assert!(
        wait_until(Duration::from_secs(2), || {
            listener.count_for("mailbox-poller", TerminalState::Cancelled) == 1
        })
        .await
    );
    assert!(engine.queue().is_empty().await);

    engine.shutdown(ShutdownMode::Graceful).await;
}

#[tokio::test]
async fn test_engine_bounded_queue_notifies_overflow() {
    let mut config = fast_config();
    config.dispatcher.queue_capacity = Some(2);
    let engine = SchedulerEngine::new(config).unwrap();

    let overflow: Arc<CollectingOverflowListener<Arc<TimerTask>>> =
        CollectingOverflowListener::new();
    engine
        .queue()
        .add_overflow_listener(overflow.clone() as Arc<dyn OverflowListener<Arc<TimerTask>>>)
        .await;

    // 引擎未启动，三次提交全部停留在队列里，第三次触发淘汰
    for name in ["first", "second", "third"] {
        let task = TimerTask::builder(name).build(CountingWork::new()).unwrap();
        engine.submit(task).await.unwrap();
    }

    assert_eq!(engine.queue().len().await, 2);
    let evicted = overflow.evicted();
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].name(), "first");
}

#[tokio::test]
async fn test_engine_rejects_invalid_config() {
    let mut config = fast_config();
    config.dispatcher.round_interval_ms = 0;
    assert!(SchedulerEngine::new(config).is_err());

    let mut config = fast_config();
    config.worker_pool.mode = PoolMode::Fixed;
    config.worker_pool.size = 0;
    assert!(SchedulerEngine::new(config).is_err());
}

#[tokio::test]
async fn test_global_engine_is_a_singleton() {
    let first = global_engine().unwrap();
    let second = global_engine().unwrap();
    assert!(std::ptr::eq(first, second));
}
