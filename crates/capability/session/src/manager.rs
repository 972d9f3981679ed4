//! 会话管理：持有零或一个活动连接
//!
//! - 连接跨周期复用，任何执行失败都视为连接已失效并丢弃，下次使用时重建
//! - 认证失败锁存，直到 [`SessionManager::clear_auth_failure`]

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::error::SessionError;
use crate::transport::{ReachabilityProbe, ShellConnection, ShellConnector};

/// 会话参数
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 用于日志的目标描述（`user@host:port`）
    pub target: String,
    pub connect_timeout: Duration,
    /// 建连前先做可达性探测
    pub probe_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target: "onu".to_string(),
            connect_timeout: Duration::from_secs(10),
            probe_enabled: false,
        }
    }
}

/// 远程会话管理器
pub struct SessionManager {
    connector: Arc<dyn ShellConnector>,
    probe: Option<Arc<dyn ReachabilityProbe>>,
    config: SessionConfig,
    connection: Option<Box<dyn ShellConnection>>,
    auth_failure: Option<String>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn ShellConnector>, config: SessionConfig) -> Self {
        Self {
            connector,
            probe: None,
            config,
            connection: None,
            auth_failure: None,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// 锁存的认证失败原因
    pub fn auth_failure(&self) -> Option<&str> {
        self.auth_failure.as_deref()
    }

    /// 凭据更新后解除锁存。
    pub fn clear_auth_failure(&mut self) {
        if self.auth_failure.take().is_some() {
            info!(target: "onu.session", target_host = %self.config.target, "ssh_auth_latch_cleared");
        }
    }

    /// 探测目标是否可达；未配置探测器时视为可达。
    pub async fn probe_reachability(&self) -> bool {
        match &self.probe {
            Some(probe) => probe.is_reachable().await,
            None => true,
        }
    }

    /// 确保存在活动连接。
    pub async fn ensure_connected(&mut self) -> Result<(), SessionError> {
        if self.connection.is_some() {
            return Ok(());
        }
        if let Some(reason) = &self.auth_failure {
            return Err(SessionError::Authentication(format!(
                "latched after earlier rejection: {reason}"
            )));
        }
        if self.config.probe_enabled && !self.probe_reachability().await {
            warn!(target: "onu.session", target_host = %self.config.target, "ssh_target_unreachable");
            return Err(SessionError::Unreachable(self.config.target.clone()));
        }

        let connect_timeout = self.config.connect_timeout;
        let result = match timeout(connect_timeout, self.connector.connect(connect_timeout)).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::Timeout(format!(
                "connect exceeded {}s",
                connect_timeout.as_secs()
            ))),
        };

        match result {
            Ok(connection) => {
                onu_telemetry::record_ssh_connect();
                info!(target: "onu.session", target_host = %self.config.target, "ssh_connected");
                self.connection = Some(connection);
                Ok(())
            }
            Err(err) => {
                onu_telemetry::record_ssh_connect_failure();
                if let SessionError::Authentication(reason) = &err {
                    onu_telemetry::record_auth_failure();
                    error!(
                        target: "onu.session",
                        target_host = %self.config.target,
                        error = %err,
                        "ssh_auth_failed"
                    );
                    self.auth_failure = Some(reason.clone());
                } else {
                    warn!(
                        target: "onu.session",
                        target_host = %self.config.target,
                        kind = err.kind(),
                        error = %err,
                        "ssh_connect_failed"
                    );
                }
                Err(err)
            }
        }
    }

    /// 执行命令；超时或传输错误时丢弃连接。
    pub async fn run(
        &mut self,
        command: &str,
        command_timeout: Duration,
    ) -> Result<String, SessionError> {
        self.ensure_connected().await?;
        let Some(connection) = self.connection.as_mut() else {
            return Err(SessionError::Connection("not connected".to_string()));
        };

        let result = match timeout(command_timeout, connection.exec(command, command_timeout)).await
        {
            Ok(result) => result,
            Err(_) => Err(SessionError::Timeout(format!(
                "command exceeded {}s",
                command_timeout.as_secs()
            ))),
        };

        if let Err(err) = &result {
            // 执行线程可能仍持有会话，直接丢弃而不做有序断开
            self.connection = None;
            warn!(
                target: "onu.session",
                target_host = %self.config.target,
                kind = err.kind(),
                error = %err,
                "ssh_connection_dropped"
            );
        }
        result
    }

    /// 断开并重新建立连接（带外重连）。
    pub async fn reconnect(&mut self) -> Result<(), SessionError> {
        onu_telemetry::record_reconnect_attempt();
        info!(target: "onu.session", target_host = %self.config.target, "ssh_reconnecting");
        self.disconnect().await;
        self.ensure_connected().await
    }

    /// 有序断开。
    pub async fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
            info!(target: "onu.session", target_host = %self.config.target, "ssh_disconnected");
        }
    }
}
