use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, QoS};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::SensorSpec;
use crate::device::{DeviceDescriptor, TopicLayout};
use crate::error::PublishError;
use crate::sink::{MetricSink, MetricWrite};

/// MQTT 下游配置。
#[derive(Debug, Clone)]
pub struct MqttSinkConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub discovery_prefix: String,
    pub entity_base: String,
}

/// MQTT 下游实现：状态 QoS 1 不保留，发现配置 QoS 1 保留。
#[derive(Clone)]
pub struct MqttSink {
    client: AsyncClient,
    layout: TopicLayout,
}

impl MqttSink {
    /// 建立客户端并在后台驱动 eventloop。
    ///
    /// eventloop 在发出 DISCONNECT 或 `cancel` 触发后退出。
    pub fn connect(
        config: MqttSinkConfig,
        cancel: CancellationToken,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), PublishError> {
        if config.host.trim().is_empty() {
            return Err(PublishError::Connection("empty mqtt host".to_string()));
        }
        let mut options = MqttOptions::new(config.client_id, config.host, config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) = (config.username, config.password) {
            options.set_credentials(username, password);
        }
        let (client, mut eventloop) = AsyncClient::new(options, 64);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!(target: "onu.publish", "mqtt_eventloop_stopped");
                        break;
                    }
                    event = eventloop.poll() => match event {
                        Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                            info!(target: "onu.publish", "mqtt_disconnected");
                            break;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(target: "onu.publish", "mqtt eventloop error: {}", err);
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        });
        Ok((
            Self {
                client,
                layout: TopicLayout {
                    discovery_prefix: config.discovery_prefix,
                    entity_base: config.entity_base,
                },
            },
            handle,
        ))
    }

    /// 排入 DISCONNECT；请求队列已满时放弃，返回是否已排入。
    pub fn disconnect(&self) -> bool {
        match self.client.try_disconnect() {
            Ok(()) => true,
            Err(err) => {
                debug!(target: "onu.publish", error = %err, "mqtt_disconnect_failed");
                false
            }
        }
    }

    /// 只排入请求队列，不等待；broker 不可达导致队列满时直接返回错误。
    fn publish(&self, topic: String, retain: bool, payload: Vec<u8>) -> Result<(), PublishError> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, retain, payload)
            .map_err(|err| PublishError::Publish(err.to_string()))
    }
}

#[async_trait]
impl MetricSink for MqttSink {
    async fn announce(
        &self,
        device: &DeviceDescriptor,
        sensors: &[SensorSpec],
    ) -> Result<(), PublishError> {
        for spec in sensors {
            let topic =
                self.layout
                    .discovery_topic(spec.component.as_str(), &device.device_id, spec.key);
            let payload = serde_json::to_vec(&self.layout.discovery_config(device, spec))
                .map_err(|err| PublishError::Payload(err.to_string()))?;
            self.publish(topic, true, payload)?;
        }
        info!(
            target: "onu.publish",
            device_id = %device.device_id,
            sensors = sensors.len(),
            "discovery_published"
        );
        Ok(())
    }

    async fn write(&self, device_id: &str, write: &MetricWrite) -> Result<(), PublishError> {
        let component = write.component.as_str();
        let state_topic = self.layout.state_topic(component, device_id, &write.key);
        self.publish(state_topic, false, write.state.clone().into_bytes())?;

        if !write.attributes.is_empty() {
            let topic = self
                .layout
                .attributes_topic(component, device_id, &write.key);
            let payload = serde_json::to_vec(&write.attributes)
                .map_err(|err| PublishError::Payload(err.to_string()))?;
            self.publish(topic, false, payload)?;
        }
        Ok(())
    }
}
