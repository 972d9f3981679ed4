//! WAS-110 ONU → Home Assistant MQTT 桥接进程。
//!
//! 常规模式：按间隔轮询 ONU 并持续发布；`ONU_TEST_MODE=true` 时只跑一个周期并打印结果。

mod bridge;
mod diagnostics;
mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use onu_config::BridgeConfig;
use onu_publish::MqttSink;
use onu_telemetry::init_tracing;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const MQTT_DISCONNECT_GRACE: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = BridgeConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    if config.test_mode {
        return diagnostics::run(&config).await;
    }

    info!(
        target: "onu.bridge",
        version = bridge::VERSION,
        host = %config.host,
        mqtt_host = %config.mqtt_host,
        interval_secs = config.poll_interval_seconds,
        "bridge_starting"
    );

    let cancel = CancellationToken::new();
    // MQTT eventloop 单独的停止信号：轮询结束并发出 DISCONNECT 之后才取消
    let mqtt_cancel = CancellationToken::new();
    let (sink, mut eventloop) =
        MqttSink::connect(bridge::mqtt_config(&config), mqtt_cancel.clone())?;
    let mut poller = bridge::build_poller(&config, Arc::new(sink.clone()));

    let watcher = cancel.clone();
    tokio::spawn(async move {
        shutdown::wait_for_shutdown().await;
        info!(target: "onu.bridge", "shutdown_signal_received");
        watcher.cancel();
    });

    poller.run(cancel.clone()).await;

    // broker 不可达时 DISCONNECT 发不出去，超时后强制停止 eventloop
    let flushed = sink.disconnect()
        && tokio::time::timeout(MQTT_DISCONNECT_GRACE, &mut eventloop)
            .await
            .is_ok();
    if !flushed {
        mqtt_cancel.cancel();
        if let Err(err) = eventloop.await {
            warn!(target: "onu.bridge", error = %err, "mqtt_eventloop_join_failed");
        }
    }

    let snapshot = onu_telemetry::metrics().snapshot();
    info!(
        target: "onu.bridge",
        cycles_ok = snapshot.cycles_ok,
        cycles_failed = snapshot.cycles_failed,
        publish_failed = snapshot.publish_failed,
        "bridge_stopped"
    );
    Ok(())
}
