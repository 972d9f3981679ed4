//! 会话传输抽象

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SessionError;

/// 远程 shell 连接（单条已认证会话）。
#[async_trait]
pub trait ShellConnection: Send + Sync {
    /// 执行一条命令并返回完整 stdout。
    async fn exec(&mut self, command: &str, timeout: Duration) -> Result<String, SessionError>;

    /// 有序断开。
    async fn close(&mut self);
}

/// 建立远程 shell 连接。
#[async_trait]
pub trait ShellConnector: Send + Sync {
    async fn connect(&self, timeout: Duration) -> Result<Box<dyn ShellConnection>, SessionError>;
}

/// 建连前的可达性探测。
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}
