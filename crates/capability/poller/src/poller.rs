use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use domain::{BridgeRunStats, DeviceIdentity, MetricsRecord};
use onu_protocol::{CommandComposer, DecodeError, decode_reply};
use onu_publish::MetricPublisher;
use onu_session::{SessionError, SessionManager};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

/// 轮询参数。
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub poll_interval: Duration,
    pub command_timeout: Duration,
    /// 连续失败达到该次数时尝试带外重连
    pub reconnect_threshold: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            command_timeout: Duration::from_secs(10),
            reconnect_threshold: 3,
        }
    }
}

/// 周期失败原因。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Session(#[from] SessionError),

    /// 命令返回了输出，但不是组合命令应有的格式
    #[error(transparent)]
    Reply(#[from] DecodeError),
}

impl CycleError {
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::Session(err) => err.kind(),
            CycleError::Reply(_) => "malformed_reply",
        }
    }
}

/// 单个周期的结果。
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Updated(MetricsRecord),
    Failed(CycleError),
}

impl CycleOutcome {
    pub fn record(&self) -> Option<&MetricsRecord> {
        match self {
            CycleOutcome::Updated(record) => Some(record),
            CycleOutcome::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Updated(_))
    }
}

/// 轮询器。
pub struct Poller {
    session: SessionManager,
    composer: CommandComposer,
    publisher: MetricPublisher,
    config: PollerConfig,
    stats: BridgeRunStats,
    /// EEPROM50 解码失败的周期沿用上次的身份信息
    identity: Option<DeviceIdentity>,
}

impl Poller {
    pub fn new(session: SessionManager, publisher: MetricPublisher, config: PollerConfig) -> Self {
        Self {
            session,
            composer: CommandComposer::default(),
            publisher,
            config,
            stats: BridgeRunStats::new(),
            identity: None,
        }
    }

    pub fn with_composer(mut self, composer: CommandComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn stats(&self) -> &BridgeRunStats {
        &self.stats
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    /// 定时循环，直到 `cancel` 触发；退出前断开会话。
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!(
            target: "onu.poller",
            interval_secs = self.config.poll_interval.as_secs(),
            reconnect_threshold = self.config.reconnect_threshold,
            "poller_started"
        );
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.poll_once() => {}
            }
        }

        self.session.disconnect().await;
        info!(
            target: "onu.poller",
            total_updates = self.stats.total_updates,
            total_errors = self.stats.total_errors,
            "poller_stopped"
        );
    }

    /// 执行一个完整周期并发布结果。
    pub async fn poll_once(&mut self) -> CycleOutcome {
        let cycle_id = onu_telemetry::new_cycle_id();
        let span = info_span!("poll_cycle", cycle_id = %cycle_id);
        self.cycle().instrument(span).await
    }

    async fn cycle(&mut self) -> CycleOutcome {
        let started = Instant::now();
        let command = self.composer.compose();

        let result = match self.session.run(&command, self.config.command_timeout).await {
            Ok(output) => decode_reply(&output, &self.composer).map_err(CycleError::from),
            Err(err) => Err(CycleError::from(err)),
        };

        let outcome = match result {
            Ok(record) => {
                let record = self.merge_identity(record);
                let elapsed = started.elapsed();
                self.stats.record_success(elapsed);
                onu_telemetry::record_cycle_ok(elapsed.as_millis() as u64);
                info!(
                    target: "onu.poller",
                    duration_ms = elapsed.as_millis() as u64,
                    fields = record.entries().len(),
                    link_up = record.link.as_ref().map(|link| link.link_up()),
                    rx_power_dbm = record.optical.as_ref().map(|optical| optical.rx_power_dbm),
                    "poll_cycle_completed"
                );
                CycleOutcome::Updated(record)
            }
            Err(err) => {
                self.stats.record_failure(err.to_string(), now_iso());
                onu_telemetry::record_cycle_failed();
                warn!(
                    target: "onu.poller",
                    kind = err.kind(),
                    error = %err,
                    consecutive_errors = self.stats.consecutive_errors,
                    "poll_cycle_failed"
                );
                if self.stats.consecutive_errors >= self.config.reconnect_threshold {
                    self.try_reconnect().await;
                }
                CycleOutcome::Failed(err)
            }
        };

        self.publisher
            .publish_cycle(outcome.record(), &self.stats)
            .await;
        outcome
    }

    async fn try_reconnect(&mut self) {
        match self.session.reconnect().await {
            Ok(()) => {
                info!(target: "onu.poller", "ssh_reconnected");
            }
            Err(err) => {
                self.stats.record_reconnect_failure();
                warn!(
                    target: "onu.poller",
                    error = %err,
                    reconnections = self.stats.reconnections,
                    "ssh_reconnect_failed"
                );
            }
        }
    }

    fn merge_identity(&mut self, mut record: MetricsRecord) -> MetricsRecord {
        match &record.identity {
            Some(identity) => self.identity = Some(identity.clone()),
            None => record.identity = self.identity.clone(),
        }
        record
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
