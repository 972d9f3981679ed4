//! ICMP 可达性探测（调用系统 `ping`）

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::transport::ReachabilityProbe;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// `ping -c 1 -W 2 <host>`，3 秒内退出码为 0 视为可达。
#[derive(Debug, Clone)]
pub struct PingProbe {
    host: String,
}

impl PingProbe {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

#[async_trait]
impl ReachabilityProbe for PingProbe {
    async fn is_reachable(&self) -> bool {
        let mut command = Command::new("ping");
        command
            .args(["-c", "1", "-W", "2", self.host.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(PROBE_TIMEOUT, command.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(err)) => {
                debug!(target: "onu.session", host = %self.host, error = %err, "ping_spawn_failed");
                false
            }
            Err(_) => {
                debug!(target: "onu.session", host = %self.host, "ping_timeout");
                false
            }
        }
    }
}
