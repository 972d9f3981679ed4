use domain::{
    DeviceProfile, LinkState, MemoryUsage, MetricValue, MetricsRecord, OpticalDiagnostics,
    SystemCounters,
};

#[test]
fn empty_record_has_no_entries() {
    let record = MetricsRecord::default();
    assert!(record.is_empty());
    assert!(record.get("rx_power_dbm").is_none());
}

#[test]
fn record_flattens_to_stable_keys() {
    let record = MetricsRecord {
        optical: Some(OpticalDiagnostics {
            temperature: 38.5,
            voltage: 3.3,
            tx_bias: 11.0,
            tx_power_mw: 3.44,
            tx_power_dbm: 5.37,
            rx_power_mw: 0.0319,
            rx_power_dbm: -14.96,
        }),
        link: Some(LinkState {
            state_code: 51,
            previous_code: Some(40),
            time_in_state: Some(86_400),
        }),
        system: SystemCounters {
            cpu_temps: vec![47.5],
            memory: Some(MemoryUsage {
                total: 0,
                used: 100,
                free: 0,
            }),
            ..SystemCounters::default()
        },
        profile: DeviceProfile {
            gpon_serial: Some("HUMA12345678".to_string()),
            ..DeviceProfile::default()
        },
        ..MetricsRecord::default()
    };

    assert_eq!(record.get("rx_power_dbm"), Some(MetricValue::F64(-14.96)));
    assert_eq!(record.get("pon_link"), Some(MetricValue::Bool(true)));
    assert_eq!(
        record.get("pon_state_name"),
        Some(MetricValue::Text("O5.1 - Associated state".to_string()))
    );
    assert_eq!(
        record.get("pon_previous_state"),
        Some(MetricValue::Text("O4 - Ranging state".to_string()))
    );
    assert_eq!(record.get("cpu0_temperature"), Some(MetricValue::F64(47.5)));
    assert!(record.get("cpu1_temperature").is_none());
    // total 为 0 时只跳过百分比
    assert!(record.get("memory_percent").is_none());
    assert_eq!(record.get("memory_used"), Some(MetricValue::I64(100)));
    assert_eq!(record.get("isp"), Some(MetricValue::Text("AT&T".to_string())));
}

#[test]
fn metric_value_serializes_untagged() {
    let json = serde_json::to_string(&MetricValue::F64(-14.96)).expect("json");
    assert_eq!(json, "-14.96");
    let json = serde_json::to_string(&MetricValue::Bool(true)).expect("json");
    assert_eq!(json, "true");
}
