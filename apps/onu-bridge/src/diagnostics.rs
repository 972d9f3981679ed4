//! 测试模式：只跑一个周期，打印解码结果后退出，不连接 MQTT。
//!
//! 输出中的序列号与密码一律打码。

use std::sync::Arc;

use domain::MetricsRecord;
use onu_config::BridgeConfig;
use onu_poller::CycleOutcome;
use onu_publish::NoopSink;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::bridge;

const REDACTED: &str = "***REDACTED***";
const SENSITIVE_KEYS: &[&str] = &["gpon_serial", "serial_number", "password", "mqtt_password"];

pub async fn run(config: &BridgeConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(target: "onu.bridge", host = %config.host, "diagnostics_started");
    let mut poller = bridge::build_poller(config, Arc::new(NoopSink));
    let outcome = poller.poll_once().await;
    poller.session_mut().disconnect().await;

    let report = report(config, &outcome);
    println!("{}", serde_json::to_string_pretty(&report)?);

    match outcome {
        CycleOutcome::Updated(_) => {
            info!(target: "onu.bridge", "diagnostics_passed");
            Ok(())
        }
        CycleOutcome::Failed(err) => {
            warn!(target: "onu.bridge", error = %err, "diagnostics_failed");
            Err(err.into())
        }
    }
}

fn report(config: &BridgeConfig, outcome: &CycleOutcome) -> Value {
    let mut report = Map::new();
    report.insert("config".into(), config_summary(config));
    match outcome {
        CycleOutcome::Updated(record) => {
            report.insert("status".into(), json!("ok"));
            report.insert("metrics".into(), record_json(record));
        }
        CycleOutcome::Failed(err) => {
            report.insert("status".into(), json!("error"));
            report.insert("error_kind".into(), json!(err.kind()));
            report.insert("error".into(), json!(err.to_string()));
        }
    }
    Value::Object(report)
}

fn config_summary(config: &BridgeConfig) -> Value {
    let mut summary = json!({
        "host": config.host,
        "port": config.port,
        "username": config.username,
        "password": config.password,
        "poll_interval_seconds": config.poll_interval_seconds,
        "command_timeout_seconds": config.command_timeout_seconds,
        "connect_timeout_seconds": config.connect_timeout_seconds,
        "reconnect_threshold": config.reconnect_threshold,
        "ping_enabled": config.ping_enabled,
        "mqtt_host": config.mqtt_host,
        "mqtt_port": config.mqtt_port,
        "mqtt_password": config.mqtt_password,
        "discovery_prefix": config.discovery_prefix,
        "entity_base": config.entity_base,
    });
    redact(&mut summary);
    summary
}

fn record_json(record: &MetricsRecord) -> Value {
    let mut metrics = Map::new();
    for entry in record.entries() {
        metrics.insert(entry.key.to_string(), json!(entry.value));
    }
    let mut value = Value::Object(metrics);
    redact(&mut value);
    value
}

/// 将敏感字段替换为占位符；空值保持原样。
fn redact(value: &mut Value) {
    if let Value::Object(map) = value {
        for (key, field) in map.iter_mut() {
            let sensitive = SENSITIVE_KEYS.contains(&key.as_str());
            let present = match field {
                Value::Null => false,
                Value::String(text) => !text.is_empty(),
                _ => true,
            };
            if sensitive && present {
                *field = json!(REDACTED);
            } else {
                redact(field);
            }
        }
    }
}
