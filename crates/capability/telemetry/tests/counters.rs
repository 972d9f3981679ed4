use onu_telemetry::{
    TelemetryMetrics, metrics, new_cycle_id, record_cycle_ok, record_decode_failure,
};

#[test]
fn cycle_ids_unique() {
    let first = new_cycle_id();
    let second = new_cycle_id();
    assert!(!first.is_empty());
    assert_ne!(first, second);
}

#[test]
fn fresh_metrics_start_at_zero() {
    let snapshot = TelemetryMetrics::new().snapshot();
    assert_eq!(snapshot.cycles_ok, 0);
    assert_eq!(snapshot.average_cycle_latency_ms(), 0);
}

#[test]
fn global_counters_only_grow() {
    let before = metrics().snapshot();
    record_cycle_ok(40);
    record_decode_failure();
    let after = metrics().snapshot();
    assert!(after.cycles_ok > before.cycles_ok);
    assert!(after.decode_failures > before.decode_failures);
    assert!(after.cycle_latency_ms_total >= before.cycle_latency_ms_total + 40);
}
