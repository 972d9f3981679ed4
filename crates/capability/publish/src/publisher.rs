//! 周期结果 → 实体写入
//!
//! 成功周期：每个存在的字段一次状态写入 + 属性包，随后 SSH 健康与桥接统计。
//! 失败周期：只写 SSH 健康（OFF）与桥接统计，不写任何光学字段。
//! 下游失败只计数并记录日志，不向调用方传播。

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use domain::format::{celsius_to_fahrenheit, format_duration, format_uptime};
use domain::{BridgeRunStats, MetricEntry, MetricValue, MetricsRecord};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::catalog::{BRIDGE_UPTIME, Component, SSH_CONNECTION_STATUS, find_sensor, sensor_catalog};
use crate::device::DeviceDescriptor;
use crate::sink::{MetricSink, MetricWrite};

/// 发布器参数
#[derive(Debug, Clone)]
pub struct PublisherOptions {
    /// ONU 地址（device 块的 configuration_url）
    pub host: String,
    /// 桥接进程版本（统计属性中的 version）
    pub version: String,
}

/// 单次发布结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub writes: usize,
    pub failures: usize,
}

/// 指标发布器
pub struct MetricPublisher {
    sink: Arc<dyn MetricSink>,
    options: PublisherOptions,
    device: Option<DeviceDescriptor>,
    announced: Option<String>,
}

impl MetricPublisher {
    pub fn new(sink: Arc<dyn MetricSink>, options: PublisherOptions) -> Self {
        Self {
            sink,
            options,
            device: None,
            announced: None,
        }
    }

    pub fn device(&self) -> Option<&DeviceDescriptor> {
        self.device.as_ref()
    }

    /// 发布一个周期的结果；`record` 为 `None` 表示本周期失败。
    pub async fn publish_cycle(
        &mut self,
        record: Option<&MetricsRecord>,
        stats: &BridgeRunStats,
    ) -> PublishSummary {
        let timestamp = now_iso();
        let device = self.resolve_device(record);
        self.ensure_announced(&device).await;

        let mut writes = match record {
            Some(record) => metric_writes(record, &timestamp),
            None => Vec::new(),
        };
        writes.push(connection_status(record.is_some(), stats, &timestamp));
        writes.push(bridge_stats(stats, &timestamp, &self.options.version));

        let mut summary = PublishSummary::default();
        for write in &writes {
            match self.sink.write(&device.device_id, write).await {
                Ok(()) => {
                    onu_telemetry::record_publish_ok();
                    summary.writes += 1;
                }
                Err(err) => {
                    onu_telemetry::record_publish_failed();
                    summary.failures += 1;
                    warn!(
                        target: "onu.publish",
                        device_id = %device.device_id,
                        key = %write.key,
                        error = %err,
                        "metric_write_failed"
                    );
                }
            }
        }

        info!(
            target: "onu.publish",
            device_id = %device.device_id,
            writes = summary.writes,
            failures = summary.failures,
            healthy = record.is_some(),
            "cycle_published"
        );
        summary
    }

    /// 有身份信息时刷新设备描述，否则沿用缓存。
    fn resolve_device(&mut self, record: Option<&MetricsRecord>) -> DeviceDescriptor {
        let refreshed = record
            .filter(|record| record.identity.is_some() || self.device.is_none())
            .map(|record| {
                DeviceDescriptor::new(record.identity.as_ref(), &record.profile, &self.options.host)
            });
        if let Some(device) = refreshed {
            self.device = Some(device);
        }
        self.device
            .get_or_insert_with(|| {
                DeviceDescriptor::new(None, &Default::default(), &self.options.host)
            })
            .clone()
    }

    /// 设备 ID 变化（或首次）时重新发布发现配置。
    async fn ensure_announced(&mut self, device: &DeviceDescriptor) {
        if self.announced.as_deref() == Some(device.device_id.as_str()) {
            return;
        }
        match self.sink.announce(device, sensor_catalog()).await {
            Ok(()) => {
                self.announced = Some(device.device_id.clone());
            }
            Err(err) => {
                onu_telemetry::record_publish_failed();
                warn!(
                    target: "onu.publish",
                    device_id = %device.device_id,
                    error = %err,
                    "discovery_publish_failed"
                );
            }
        }
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn state_payload(component: Component, value: &MetricValue) -> String {
    match (component, value) {
        (Component::BinarySensor, MetricValue::Bool(true)) => "ON".to_string(),
        (Component::BinarySensor, MetricValue::Bool(false)) => "OFF".to_string(),
        _ => value.to_payload(),
    }
}

/// 记录中每个存在字段的写入。
pub fn metric_writes(record: &MetricsRecord, timestamp: &str) -> Vec<MetricWrite> {
    record
        .entries()
        .into_iter()
        .map(|entry| {
            let component = find_sensor(entry.key)
                .map(|spec| spec.component)
                .unwrap_or(Component::Sensor);
            let mut attributes = Map::new();
            attributes.insert("last_update".into(), json!(timestamp));
            attributes.insert("source".into(), json!(entry.source));
            extra_attributes(&entry, record, &mut attributes);
            MetricWrite {
                component,
                key: entry.key.to_string(),
                state: state_payload(component, &entry.value),
                attributes,
            }
        })
        .collect()
}

fn extra_attributes(entry: &MetricEntry, record: &MetricsRecord, attributes: &mut Map<String, Value>) {
    match entry.key {
        "optic_temperature" | "cpu0_temperature" | "cpu1_temperature" => {
            if let Some(celsius) = entry.value.as_f64() {
                attributes.insert("fahrenheit".into(), json!(celsius_to_fahrenheit(celsius)));
            }
        }
        "pon_link" => {
            if let Some(link) = &record.link {
                let seconds = link.time_in_state.unwrap_or(0);
                attributes.insert("state_code".into(), json!(link.state_code));
                attributes.insert("state_name".into(), json!(link.state_name()));
                attributes.insert("time_in_state_seconds".into(), json!(seconds));
                attributes.insert(
                    "time_in_state_formatted".into(),
                    json!(format_duration(seconds)),
                );
            }
        }
        "pon_state_name" => {
            if let Some(link) = &record.link {
                attributes.insert("state_code".into(), json!(link.state_code));
            }
        }
        "pon_time_in_state" => {
            if let Some(seconds) = record.link.as_ref().and_then(|link| link.time_in_state) {
                attributes.insert("formatted".into(), json!(format_duration(seconds)));
            }
        }
        "ethernet_speed" => {
            if let Some(speed) = record.system.ethernet_speed {
                attributes.insert("link_detected".into(), json!(speed > 0));
                attributes.insert("speed_formatted".into(), json!(format_speed(speed)));
            }
        }
        "onu_uptime" => {
            if let Some(uptime) = record.system.uptime_secs {
                attributes.insert("formatted".into(), json!(format_uptime(uptime)));
            }
        }
        "memory_used" => {
            if let Some(memory) = &record.system.memory {
                attributes.insert("memory_total".into(), json!(memory.total));
                attributes.insert("memory_free".into(), json!(memory.free));
            }
        }
        _ => {}
    }
}

fn format_speed(mbps: u32) -> String {
    if mbps >= 1000 {
        format!("{} Gbps", mbps as f64 / 1000.0)
    } else {
        format!("{mbps} Mbps")
    }
}

fn connection_status(healthy: bool, stats: &BridgeRunStats, timestamp: &str) -> MetricWrite {
    let mut attributes = Map::new();
    attributes.insert("last_update".into(), json!(timestamp));
    attributes.insert("consecutive_errors".into(), json!(stats.consecutive_errors));
    attributes.insert("source".into(), json!("monitoring_loop"));
    if !healthy {
        attributes.insert("last_error".into(), json!(stats.last_error));
    }
    MetricWrite {
        component: Component::BinarySensor,
        key: SSH_CONNECTION_STATUS.to_string(),
        state: if healthy { "ON" } else { "OFF" }.to_string(),
        attributes,
    }
}

fn bridge_stats(stats: &BridgeRunStats, timestamp: &str, version: &str) -> MetricWrite {
    let mut attributes = Map::new();
    attributes.insert("total_updates".into(), json!(stats.total_updates));
    attributes.insert("total_errors".into(), json!(stats.total_errors));
    attributes.insert("consecutive_errors".into(), json!(stats.consecutive_errors));
    attributes.insert("error_rate_percent".into(), json!(stats.error_rate_percent()));
    attributes.insert("last_update".into(), json!(timestamp));
    attributes.insert("last_error".into(), json!(stats.last_error));
    attributes.insert("last_error_time".into(), json!(stats.last_error_time));
    attributes.insert("ssh_reconnections".into(), json!(stats.reconnections));
    attributes.insert(
        "average_update_duration_ms".into(),
        json!(stats.average_duration_ms()),
    );
    attributes.insert("version".into(), json!(version));
    MetricWrite {
        component: Component::Sensor,
        key: BRIDGE_UPTIME.to_string(),
        state: stats.uptime().as_secs().to_string(),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{LinkState, OpticalDiagnostics, SystemCounters};

    fn record() -> MetricsRecord {
        MetricsRecord {
            optical: Some(OpticalDiagnostics {
                temperature: 40.0,
                voltage: 3.3,
                tx_bias: 11.0,
                tx_power_mw: 3.44,
                tx_power_dbm: 5.37,
                rx_power_mw: 0.0319,
                rx_power_dbm: -14.96,
            }),
            link: Some(LinkState {
                state_code: 51,
                previous_code: None,
                time_in_state: Some(3725),
            }),
            system: SystemCounters {
                ethernet_speed: Some(10000),
                uptime_secs: Some(90_061),
                ..SystemCounters::default()
            },
            ..MetricsRecord::default()
        }
    }

    fn find<'a>(writes: &'a [MetricWrite], key: &str) -> &'a MetricWrite {
        writes.iter().find(|write| write.key == key).unwrap()
    }

    #[test]
    fn test_metric_writes_attributes() {
        let writes = metric_writes(&record(), "2026-01-01T00:00:00Z");

        let temp = find(&writes, "optic_temperature");
        assert_eq!(temp.attributes["fahrenheit"], json!(104.0));
        assert_eq!(temp.attributes["source"], json!("eeprom51"));

        let link = find(&writes, "pon_link");
        assert_eq!(link.component, Component::BinarySensor);
        assert_eq!(link.state, "ON");
        assert_eq!(link.attributes["time_in_state_formatted"], json!("1h 2m 5s"));

        let speed = find(&writes, "ethernet_speed");
        assert_eq!(speed.state, "10000");
        assert_eq!(speed.attributes["speed_formatted"], json!("10 Gbps"));
        assert_eq!(speed.attributes["link_detected"], json!(true));

        let uptime = find(&writes, "onu_uptime");
        assert_eq!(uptime.attributes["formatted"], json!("1d 1h 1m"));

        assert!(writes.iter().all(|write| write.attributes.contains_key("last_update")));
    }

    #[test]
    fn test_speed_formatting() {
        assert_eq!(format_speed(2500), "2.5 Gbps");
        assert_eq!(format_speed(100), "100 Mbps");
        assert_eq!(format_speed(0), "0 Mbps");
    }

    #[test]
    fn test_unhealthy_connection_status() {
        let mut stats = BridgeRunStats::new();
        stats.record_failure("timeout", "2026-01-01T00:00:00Z");
        let write = connection_status(false, &stats, "t");
        assert_eq!(write.state, "OFF");
        assert_eq!(write.attributes["last_error"], json!("timeout"));
        assert_eq!(write.attributes["consecutive_errors"], json!(1));
    }
}
