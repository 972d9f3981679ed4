//! 基于 libssh2 的 SSH 连接
//!
//! libssh2 是阻塞 API：建连与执行都放在 `spawn_blocking` 中，
//! 同时设置会话级超时，外层再由调用方套 `tokio::time::timeout`。
//!
//! 认证顺序：
//! 1. `auth_methods` 查询（Dropbear 允许 none 认证时直接通过）
//! 2. 配置了密码则 `userauth_password`
//! 3. 否则尝试 ssh-agent

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use ssh2::{ErrorCode, Session};
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::transport::{ShellConnection, ShellConnector};

/// libssh2 `LIBSSH2_ERROR_AUTHENTICATION_FAILED`
const AUTHENTICATION_FAILED: i32 = -18;
/// libssh2 `LIBSSH2_ERROR_PUBLICKEY_UNVERIFIED`
const PUBLICKEY_UNVERIFIED: i32 = -19;

const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// SSH 目标与凭据
#[derive(Debug, Clone)]
pub struct SshSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// 为空时改用 ssh-agent
    pub password: String,
}

/// SSH 连接器
#[derive(Debug, Clone)]
pub struct SshConnector {
    settings: SshSettings,
}

impl SshConnector {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ShellConnector for SshConnector {
    async fn connect(&self, timeout: Duration) -> Result<Box<dyn ShellConnection>, SessionError> {
        let settings = self.settings.clone();
        let session = tokio::task::spawn_blocking(move || open_session(&settings, timeout))
            .await
            .map_err(|e| SessionError::Connection(format!("connect task failed: {e}")))??;
        Ok(Box::new(SshConnection {
            session: Some(session),
        }))
    }
}

/// 已认证的 SSH 会话
pub struct SshConnection {
    session: Option<Session>,
}

#[async_trait]
impl ShellConnection for SshConnection {
    async fn exec(&mut self, command: &str, timeout: Duration) -> Result<String, SessionError> {
        let session = self
            .session
            .clone()
            .ok_or_else(|| SessionError::Connection("session closed".to_string()))?;
        let command = command.to_string();
        tokio::task::spawn_blocking(move || exec_blocking(&session, &command, timeout))
            .await
            .map_err(|e| SessionError::Command(format!("exec task failed: {e}")))?
    }

    async fn close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let handle = tokio::task::spawn_blocking(move || {
            session.set_timeout(millis(CLOSE_GRACE));
            session.disconnect(None, "bridge shutdown", None)
        });
        match tokio::time::timeout(CLOSE_GRACE, handle).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(err))) => {
                debug!(target: "onu.session", error = %err, "ssh_disconnect_failed");
            }
            Ok(Err(err)) => {
                debug!(target: "onu.session", error = %err, "ssh_disconnect_task_failed");
            }
            Err(_) => {
                warn!(target: "onu.session", "ssh_disconnect_timeout");
            }
        }
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

fn transport_error(stage: &str, err: impl std::fmt::Display) -> SessionError {
    SessionError::Connection(format!("{stage}: {err}"))
}

fn is_auth_rejection(err: &ssh2::Error) -> bool {
    matches!(
        err.code(),
        ErrorCode::Session(AUTHENTICATION_FAILED) | ErrorCode::Session(PUBLICKEY_UNVERIFIED)
    )
}

fn open_session(settings: &SshSettings, timeout: Duration) -> Result<Session, SessionError> {
    let addr = (settings.host.as_str(), settings.port)
        .to_socket_addrs()
        .map_err(|e| transport_error("resolve", e))?
        .next()
        .ok_or_else(|| SessionError::Connection(format!("no address for {}", settings.host)))?;

    let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(|e| match e.kind() {
        std::io::ErrorKind::TimedOut => SessionError::Timeout(format!("connect {addr}")),
        _ => transport_error("connect", e),
    })?;

    let mut session = Session::new().map_err(|e| transport_error("session", e))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(millis(timeout));
    session
        .handshake()
        .map_err(|e| transport_error("handshake", e))?;

    let methods = session
        .auth_methods(&settings.username)
        .map_err(|e| transport_error("auth methods", e))?
        .to_string();
    debug!(target: "onu.session", methods = %methods, "ssh_auth_methods");

    if !session.authenticated() {
        if settings.password.is_empty() {
            session
                .userauth_agent(&settings.username)
                .map_err(|e| SessionError::Authentication(format!("agent: {e}")))?;
        } else {
            session
                .userauth_password(&settings.username, &settings.password)
                .map_err(|e| {
                    if is_auth_rejection(&e) {
                        SessionError::Authentication(e.to_string())
                    } else {
                        transport_error("password auth", e)
                    }
                })?;
        }
    }

    if !session.authenticated() {
        return Err(SessionError::Authentication(
            "not authenticated after userauth".to_string(),
        ));
    }
    session.set_keepalive(true, 30);
    Ok(session)
}

fn exec_blocking(
    session: &Session,
    command: &str,
    timeout: Duration,
) -> Result<String, SessionError> {
    session.set_timeout(millis(timeout));
    let mut channel = session
        .channel_session()
        .map_err(|e| transport_error("open channel", e))?;
    channel
        .exec(command)
        .map_err(|e| SessionError::Command(e.to_string()))?;

    let mut output = Vec::new();
    channel.read_to_end(&mut output).map_err(|e| match e.kind() {
        std::io::ErrorKind::TimedOut => SessionError::Timeout("read stdout".to_string()),
        _ => transport_error("read stdout", e),
    })?;
    channel
        .wait_close()
        .map_err(|e| transport_error("close channel", e))?;
    if let Ok(status) = channel.exit_status() {
        if status != 0 {
            debug!(target: "onu.session", exit_status = status, "ssh_exec_nonzero_exit");
        }
    }
    Ok(stdout_text(output))
}

/// 非 UTF-8 字节直接丢弃，只影响所在字段。
fn stdout_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug!(target: "onu.session", "ssh_stdout_invalid_utf8");
            String::from_utf8_lossy(err.as_bytes()).replace(char::REPLACEMENT_CHARACTER, "")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_text_valid_utf8_untouched() {
        let text = "---PON_STATUS---\ncurrent=51\n";
        assert_eq!(stdout_text(text.as_bytes().to_vec()), text);
    }

    #[test]
    fn test_stdout_text_drops_invalid_bytes() {
        let mut bytes = b"---MODULE_TYPE---\nbfw".to_vec();
        bytes.push(0xC3);
        bytes.extend_from_slice(b"\n---END---\n");
        assert_eq!(stdout_text(bytes), "---MODULE_TYPE---\nbfw\n---END---\n");
    }

    #[test]
    fn test_stdout_text_keeps_surrounding_fields() {
        let bytes = vec![b'4', 0xFF, b'7', b'5', b'0', b'0'];
        assert_eq!(stdout_text(bytes), "47500");
    }
}
