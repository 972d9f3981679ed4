//! 桥接进程运行统计（仅轮询循环写入，不持久化）。

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::format::round_to;

/// 滚动窗口保留的周期耗时条数。
pub const DURATION_WINDOW: usize = 100;

/// 进程生命周期内的轮询统计。
#[derive(Debug, Clone)]
pub struct BridgeRunStats {
    started_at: Instant,
    pub total_updates: u64,
    pub total_errors: u64,
    pub consecutive_errors: u32,
    pub last_error: Option<String>,
    /// ISO 8601
    pub last_error_time: Option<String>,
    pub reconnections: u64,
    durations_ms: VecDeque<f64>,
}

impl Default for BridgeRunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeRunStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_updates: 0,
            total_errors: 0,
            consecutive_errors: 0,
            last_error: None,
            last_error_time: None,
            reconnections: 0,
            durations_ms: VecDeque::with_capacity(DURATION_WINDOW),
        }
    }

    /// 记录成功周期：清零连续错误，累计更新次数，写入耗时窗口。
    pub fn record_success(&mut self, duration: Duration) {
        self.consecutive_errors = 0;
        self.total_updates = self.total_updates.saturating_add(1);
        self.durations_ms.push_back(duration.as_secs_f64() * 1000.0);
        while self.durations_ms.len() > DURATION_WINDOW {
            self.durations_ms.pop_front();
        }
    }

    /// 记录失败周期。
    pub fn record_failure(&mut self, message: impl Into<String>, timestamp: impl Into<String>) {
        self.total_errors = self.total_errors.saturating_add(1);
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        self.last_error = Some(message.into());
        self.last_error_time = Some(timestamp.into());
    }

    /// 记录一次失败的带外重连。
    pub fn record_reconnect_failure(&mut self) {
        self.reconnections = self.reconnections.saturating_add(1);
    }

    /// 窗口内平均耗时（毫秒，取整），无样本为 0。
    pub fn average_duration_ms(&self) -> f64 {
        if self.durations_ms.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.durations_ms.iter().sum();
        (sum / self.durations_ms.len() as f64).round()
    }

    /// 错误率 = errors / updates * 100（2 位小数）。
    pub fn error_rate_percent(&self) -> f64 {
        if self.total_updates == 0 {
            return 0.0;
        }
        round_to(
            self.total_errors as f64 / self.total_updates as f64 * 100.0,
            2,
        )
    }

    pub fn duration_samples(&self) -> usize {
        self.durations_ms.len()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_resets_consecutive_errors() {
        let mut stats = BridgeRunStats::new();
        stats.record_failure("timeout", "2026-01-01T00:00:00Z");
        stats.record_failure("timeout", "2026-01-01T00:01:00Z");
        assert_eq!(stats.consecutive_errors, 2);
        assert_eq!(stats.total_errors, 2);

        stats.record_success(Duration::from_millis(120));
        assert_eq!(stats.consecutive_errors, 0);
        assert_eq!(stats.total_errors, 2);
        assert_eq!(stats.total_updates, 1);
        assert_eq!(stats.last_error.as_deref(), Some("timeout"));
        assert_eq!(stats.last_error_time.as_deref(), Some("2026-01-01T00:01:00Z"));
    }

    #[test]
    fn duration_window_drops_oldest() {
        let mut stats = BridgeRunStats::new();
        for _ in 0..DURATION_WINDOW {
            stats.record_success(Duration::from_millis(1000));
        }
        assert_eq!(stats.average_duration_ms(), 1000.0);

        for _ in 0..DURATION_WINDOW {
            stats.record_success(Duration::from_millis(10));
        }
        assert_eq!(stats.duration_samples(), DURATION_WINDOW);
        assert_eq!(stats.average_duration_ms(), 10.0);
    }

    #[test]
    fn error_rate() {
        let mut stats = BridgeRunStats::new();
        assert_eq!(stats.error_rate_percent(), 0.0);
        stats.record_failure("x", "t");
        for _ in 0..3 {
            stats.record_success(Duration::from_millis(5));
        }
        assert_eq!(stats.error_rate_percent(), 33.33);
    }
}
