use std::sync::Arc;

use async_trait::async_trait;

use crate::task::TimerTask;

/// 任务终止事件监听器
///
/// 回调由调度器线程同步触发，在下一个任务评估之前执行完毕。
/// 实现必须是非阻塞的轻量逻辑，并且不得在回调里同步地把同一个
/// 任务重新提交给调度器，否则会造成无界递归。
#[async_trait]
pub trait TaskEventListener: Send + Sync {
    /// 任务被取消后触发一次
    async fn on_cancel(&self, task: Arc<TimerTask>);

    /// 任务耗尽重复次数过期后触发一次
    async fn on_expire(&self, task: Arc<TimerTask>);

    /// 任务正常完成后触发一次
    async fn on_finish(&self, task: Arc<TimerTask>);
}

/// 固定容量队列的溢出监听器
///
/// 队列在容量满时先淘汰最老的元素再插入新元素，被淘汰的元素
/// 同步地交给监听器。通知发生在队列操作的调用路径上，实现必须
/// 简单快速，不得阻塞。
pub trait OverflowListener<T>: Send + Sync {
    fn on_item_evicted(&self, item: T);
}
