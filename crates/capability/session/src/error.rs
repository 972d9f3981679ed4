//! 会话错误类型定义

/// 远程会话错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// 凭据被拒绝（锁存，不自动重试）
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// 建连或传输错误
    #[error("connection error: {0}")]
    Connection(String),

    /// 超时
    #[error("timeout: {0}")]
    Timeout(String),

    /// 远程命令执行错误
    #[error("command error: {0}")]
    Command(String),

    /// 可达性探测未通过
    #[error("host unreachable: {0}")]
    Unreachable(String),
}

impl SessionError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SessionError::Authentication(_))
    }

    /// 日志与统计中使用的错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Authentication(_) => "authentication",
            SessionError::Connection(_) => "connection",
            SessionError::Timeout(_) => "timeout",
            SessionError::Command(_) => "command",
            SessionError::Unreachable(_) => "unreachable",
        }
    }
}
