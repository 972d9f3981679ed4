use std::sync::Arc;
use std::time::Duration;

use domain::{BridgeRunStats, DeviceProfile, LinkState, MetricsRecord};
use onu_publish::{
    Component, DeviceDescriptor, MetricPublisher, MetricSink, MetricWrite, MqttSink,
    MqttSinkConfig, PublisherOptions, sensor_catalog,
};
use serde_json::{Map, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const CONNACK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];
const DISCONNECT: [u8; 2] = [0xE0, 0x00];

fn unreachable_broker() -> MqttSinkConfig {
    MqttSinkConfig {
        // 端口 1 上没有 broker，eventloop 永远连不上
        host: "127.0.0.1".to_string(),
        port: 1,
        username: None,
        password: None,
        client_id: "onu-bridge-test".to_string(),
        discovery_prefix: "homeassistant".to_string(),
        entity_base: "8311".to_string(),
    }
}

fn rx_write() -> MetricWrite {
    let mut attributes = Map::new();
    attributes.insert("source".into(), json!("eeprom51"));
    MetricWrite {
        component: Component::Sensor,
        key: "rx_power_dbm".to_string(),
        state: "-14.96".to_string(),
        attributes,
    }
}

#[tokio::test]
async fn writes_fail_fast_when_broker_unreachable() {
    let cancel = CancellationToken::new();
    let (sink, eventloop) = MqttSink::connect(unreachable_broker(), cancel.clone()).unwrap();
    let write = rx_write();

    let failures = tokio::time::timeout(Duration::from_secs(10), async {
        let mut failures = 0;
        for _ in 0..200 {
            if sink.write("8311_onu_was110_xgspon", &write).await.is_err() {
                failures += 1;
            }
        }
        failures
    })
    .await
    .expect("writes must not wait for the broker");

    // 队列容量 64，每次写入 state + attributes 两条，最多 32 次排入成功
    assert!(failures >= 100);

    let device = DeviceDescriptor::new(None, &DeviceProfile::default(), "192.168.11.1");
    let announce = tokio::time::timeout(
        Duration::from_secs(5),
        sink.announce(&device, sensor_catalog()),
    )
    .await
    .expect("announce must not wait for the broker");
    assert!(announce.is_err());
    assert!(!sink.disconnect());

    cancel.cancel();
    eventloop.await.unwrap();
}

#[tokio::test]
async fn publisher_keeps_cycling_when_broker_unreachable() {
    let cancel = CancellationToken::new();
    let (sink, eventloop) = MqttSink::connect(unreachable_broker(), cancel.clone()).unwrap();
    let sink: Arc<dyn MetricSink> = Arc::new(sink);
    let mut publisher = MetricPublisher::new(
        sink,
        PublisherOptions {
            host: "192.168.11.1".to_string(),
            version: "test".to_string(),
        },
    );
    let record = MetricsRecord {
        link: Some(LinkState {
            state_code: 51,
            previous_code: None,
            time_in_state: Some(60),
        }),
        ..MetricsRecord::default()
    };
    let stats = BridgeRunStats::new();

    let summaries = tokio::time::timeout(Duration::from_secs(10), async {
        let mut summaries = Vec::new();
        for _ in 0..5 {
            summaries.push(publisher.publish_cycle(Some(&record), &stats).await);
        }
        summaries
    })
    .await
    .expect("publish_cycle must not block on a full queue");

    let last = summaries.last().unwrap();
    assert_eq!(last.writes, 0);
    assert!(last.failures > 0);

    cancel.cancel();
    eventloop.await.unwrap();
}

/// 最小 broker：应答 CONNACK，返回之后收到的全部字节。
async fn accept_one(listener: TcpListener) -> Vec<u8> {
    let (mut stream, _) = listener.accept().await.unwrap();
    let mut buf = [0u8; 512];
    let n = stream.read(&mut buf).await.unwrap();
    assert!(n > 0 && buf[0] == 0x10, "expected CONNECT");
    stream.write_all(&CONNACK).await.unwrap();

    let mut received = Vec::new();
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => received.extend_from_slice(&buf[..n]),
        }
    }
    received
}

#[tokio::test]
async fn disconnect_is_sent_before_eventloop_exits() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let broker = tokio::spawn(accept_one(listener));

    let cancel = CancellationToken::new();
    let config = MqttSinkConfig {
        port,
        ..unreachable_broker()
    };
    let (sink, eventloop) = MqttSink::connect(config, cancel.clone()).unwrap();

    assert!(sink.disconnect());
    // 不取消 token，eventloop 发出 DISCONNECT 后自行退出
    tokio::time::timeout(Duration::from_secs(10), eventloop)
        .await
        .expect("eventloop exits after DISCONNECT")
        .unwrap();
    assert!(!cancel.is_cancelled());

    let received = tokio::time::timeout(Duration::from_secs(10), broker)
        .await
        .expect("broker sees the connection close")
        .unwrap();
    assert!(received.windows(2).any(|bytes| bytes == DISCONNECT));
}
