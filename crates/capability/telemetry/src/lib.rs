//! 追踪初始化、周期 ID 与进程级计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 进程计数器快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles_ok: u64,
    pub cycles_failed: u64,
    pub ssh_connects: u64,
    pub ssh_connect_failures: u64,
    pub auth_failures: u64,
    pub reconnect_attempts: u64,
    pub publish_ok: u64,
    pub publish_failed: u64,
    pub decode_failures: u64,
    pub cycle_latency_ms_total: u64,
    pub cycle_latency_ms_count: u64,
}

impl MetricsSnapshot {
    /// 平均周期耗时（毫秒），无样本时为 0。
    pub fn average_cycle_latency_ms(&self) -> u64 {
        self.cycle_latency_ms_total
            .checked_div(self.cycle_latency_ms_count)
            .unwrap_or(0)
    }
}

/// 进程计数器。
pub struct TelemetryMetrics {
    cycles_ok: AtomicU64,
    cycles_failed: AtomicU64,
    ssh_connects: AtomicU64,
    ssh_connect_failures: AtomicU64,
    auth_failures: AtomicU64,
    reconnect_attempts: AtomicU64,
    publish_ok: AtomicU64,
    publish_failed: AtomicU64,
    decode_failures: AtomicU64,
    cycle_latency_ms_total: AtomicU64,
    cycle_latency_ms_count: AtomicU64,
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            cycles_ok: AtomicU64::new(0),
            cycles_failed: AtomicU64::new(0),
            ssh_connects: AtomicU64::new(0),
            ssh_connect_failures: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            reconnect_attempts: AtomicU64::new(0),
            publish_ok: AtomicU64::new(0),
            publish_failed: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            cycle_latency_ms_total: AtomicU64::new(0),
            cycle_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_ok: self.cycles_ok.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            ssh_connects: self.ssh_connects.load(Ordering::Relaxed),
            ssh_connect_failures: self.ssh_connect_failures.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            publish_ok: self.publish_ok.load(Ordering::Relaxed),
            publish_failed: self.publish_failed.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            cycle_latency_ms_total: self.cycle_latency_ms_total.load(Ordering::Relaxed),
            cycle_latency_ms_count: self.cycle_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局计数器实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info，`RUST_LOG` 覆盖）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成轮询周期 ID。
pub fn new_cycle_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录成功周期及其耗时（毫秒）。
pub fn record_cycle_ok(latency_ms: u64) {
    let metrics = metrics();
    metrics.cycles_ok.fetch_add(1, Ordering::Relaxed);
    metrics
        .cycle_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .cycle_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录失败周期。
pub fn record_cycle_failed() {
    metrics().cycles_failed.fetch_add(1, Ordering::Relaxed);
}

/// 记录 SSH 建连成功。
pub fn record_ssh_connect() {
    metrics().ssh_connects.fetch_add(1, Ordering::Relaxed);
}

/// 记录 SSH 建连失败（含认证失败）。
pub fn record_ssh_connect_failure() {
    metrics()
        .ssh_connect_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录认证失败。
pub fn record_auth_failure() {
    metrics().auth_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录带外重连尝试。
pub fn record_reconnect_attempt() {
    metrics()
        .reconnect_attempts
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录 MQTT 发布成功。
pub fn record_publish_ok() {
    metrics().publish_ok.fetch_add(1, Ordering::Relaxed);
}

/// 记录 MQTT 发布失败。
pub fn record_publish_failed() {
    metrics().publish_failed.fetch_add(1, Ordering::Relaxed);
}

/// 记录段解码失败。
pub fn record_decode_failure() {
    metrics().decode_failures.fetch_add(1, Ordering::Relaxed);
}
