use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domain::{BridgeRunStats, DeviceIdentity, MetricsRecord, OpticalDiagnostics};
use onu_publish::{
    BRIDGE_UPTIME, DeviceDescriptor, MetricPublisher, MetricSink, MetricWrite, PublishError,
    PublisherOptions, SSH_CONNECTION_STATUS, SensorSpec, find_sensor, sensor_catalog,
};

#[derive(Default)]
struct RecordingSink {
    announced: Mutex<Vec<String>>,
    writes: Mutex<Vec<(String, MetricWrite)>>,
    fail_key: Option<&'static str>,
}

#[async_trait]
impl MetricSink for RecordingSink {
    async fn announce(
        &self,
        device: &DeviceDescriptor,
        _sensors: &[SensorSpec],
    ) -> Result<(), PublishError> {
        self.announced.lock().unwrap().push(device.device_id.clone());
        Ok(())
    }

    async fn write(&self, device_id: &str, write: &MetricWrite) -> Result<(), PublishError> {
        if self.fail_key == Some(write.key.as_str()) {
            return Err(PublishError::Publish("broker gone".to_string()));
        }
        self.writes
            .lock()
            .unwrap()
            .push((device_id.to_string(), write.clone()));
        Ok(())
    }
}

fn options() -> PublisherOptions {
    PublisherOptions {
        host: "192.168.11.1".to_string(),
        version: "test".to_string(),
    }
}

fn healthy_record(part_number: &str) -> MetricsRecord {
    MetricsRecord {
        optical: Some(OpticalDiagnostics {
            temperature: 38.5,
            voltage: 3.3,
            tx_bias: 11.0,
            tx_power_mw: 3.44,
            tx_power_dbm: 5.37,
            rx_power_mw: 0.0319,
            rx_power_dbm: -14.96,
        }),
        identity: Some(DeviceIdentity {
            vendor: "OEM".to_string(),
            part_number: part_number.to_string(),
            revision: "A".to_string(),
            serial_number: None,
        }),
        ..MetricsRecord::default()
    }
}

fn keys(sink: &RecordingSink) -> Vec<String> {
    sink.writes
        .lock()
        .unwrap()
        .iter()
        .map(|(_, write)| write.key.clone())
        .collect()
}

#[test]
fn catalog_covers_every_record_key() {
    let mut identity = healthy_record("XGSPONST2001");
    if let Some(identity) = identity.identity.as_mut() {
        identity.serial_number = Some("WAS110TEST123".to_string());
    }
    let text = |value: &str| Some(value.to_string());
    let record = MetricsRecord {
        link: Some(domain::LinkState {
            state_code: 51,
            previous_code: Some(40),
            time_in_state: Some(1),
        }),
        system: domain::SystemCounters {
            uptime_secs: Some(1),
            memory: Some(domain::MemoryUsage {
                total: 100,
                used: 50,
                free: 50,
            }),
            cpu_temps: vec![40.0, 41.0],
            ethernet_speed: Some(1000),
            gtc: domain::GtcCounters {
                bip_errors: Some(0),
                fec_corrected: Some(0),
                fec_uncorrected: Some(0),
                lods_events: Some(0),
            },
        },
        profile: domain::DeviceProfile {
            pon_mode: text("XGS-PON"),
            firmware_bank: text("A"),
            gpon_serial: text("HUMA12345678"),
            module_type: text("bfw"),
            pon_vendor_id: text("HUMA"),
        },
        ..identity
    };
    assert!(record.entries().len() >= 32);
    for entry in record.entries() {
        assert!(find_sensor(entry.key).is_some(), "{}", entry.key);
    }
    assert!(find_sensor(SSH_CONNECTION_STATUS).is_some());
    assert!(find_sensor(BRIDGE_UPTIME).is_some());
    assert!(sensor_catalog().len() >= 30);
}

#[tokio::test]
async fn healthy_cycle_writes_fields_health_and_stats() {
    let sink = Arc::new(RecordingSink::default());
    let mut publisher = MetricPublisher::new(sink.clone(), options());
    let mut stats = BridgeRunStats::new();
    stats.record_success(std::time::Duration::from_millis(120));

    let summary = publisher
        .publish_cycle(Some(&healthy_record("XGSPONST2001")), &stats)
        .await;

    let keys = keys(&sink);
    assert!(keys.contains(&"rx_power_dbm".to_string()));
    assert_eq!(keys[keys.len() - 2], SSH_CONNECTION_STATUS);
    assert_eq!(keys[keys.len() - 1], BRIDGE_UPTIME);
    assert_eq!(summary.failures, 0);
    assert_eq!(summary.writes, keys.len());

    let writes = sink.writes.lock().unwrap();
    let (device_id, health) = &writes[writes.len() - 2];
    assert_eq!(device_id, "8311_onu_was110_xgspon");
    assert_eq!(health.state, "ON");
    let (_, bridge) = &writes[writes.len() - 1];
    assert_eq!(bridge.attributes["total_updates"], serde_json::json!(1));
    assert_eq!(bridge.attributes["version"], serde_json::json!("test"));
}

#[tokio::test]
async fn failed_cycle_writes_no_optical_fields() {
    let sink = Arc::new(RecordingSink::default());
    let mut publisher = MetricPublisher::new(sink.clone(), options());
    let mut stats = BridgeRunStats::new();
    stats.record_failure("timeout: command exceeded 10s", "2026-01-01T00:00:00Z");

    publisher.publish_cycle(None, &stats).await;

    assert_eq!(keys(&sink), vec![SSH_CONNECTION_STATUS, BRIDGE_UPTIME]);
    let writes = sink.writes.lock().unwrap();
    assert_eq!(writes[0].1.state, "OFF");
}

#[tokio::test]
async fn discovery_announced_once_per_device_id() {
    let sink = Arc::new(RecordingSink::default());
    let mut publisher = MetricPublisher::new(sink.clone(), options());
    let stats = BridgeRunStats::new();

    publisher.publish_cycle(None, &stats).await;
    publisher
        .publish_cycle(Some(&healthy_record("XGSPONST2001")), &stats)
        .await;
    publisher
        .publish_cycle(Some(&healthy_record("XGSPONST2001")), &stats)
        .await;
    // 无身份信息的周期沿用缓存的设备
    publisher.publish_cycle(Some(&MetricsRecord::default()), &stats).await;

    assert_eq!(
        *sink.announced.lock().unwrap(),
        vec!["8311_onu_was110_unknow", "8311_onu_was110_xgspon"]
    );
    assert_eq!(
        publisher.device().map(|device| device.device_id.as_str()),
        Some("8311_onu_was110_xgspon")
    );
}

#[tokio::test]
async fn sink_failures_are_counted_not_propagated() {
    let sink = Arc::new(RecordingSink {
        fail_key: Some("rx_power_dbm"),
        ..RecordingSink::default()
    });
    let mut publisher = MetricPublisher::new(sink.clone(), options());

    let summary = publisher
        .publish_cycle(Some(&healthy_record("XGSPONST2001")), &BridgeRunStats::new())
        .await;

    assert_eq!(summary.failures, 1);
    assert!(!keys(&sink).contains(&"rx_power_dbm".to_string()));
    assert!(keys(&sink).contains(&"rx_power_mw".to_string()));
}
