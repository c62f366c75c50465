use serde_json::Value;

/// 任务的终止状态，任意一个成立即视为终止
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    Cancelled,
    Finished,
    Expired,
}

impl std::fmt::Display for TerminalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalState::Cancelled => write!(f, "Cancelled"),
            TerminalState::Finished => write!(f, "Finished"),
            TerminalState::Expired => write!(f, "Expired"),
        }
    }
}

/// 关闭模式
///
/// Graceful 会等调度循环退出后返回；Forced 直接中止循环，速度更快，
/// 但放弃本轮尚未处理完的任务评估。两种模式都不会打断已提交到
/// 工作池的任务体。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownMode {
    #[default]
    Graceful,
    Forced,
}

/// 任务携带的不透明事件数据
pub type Payload = Value;
