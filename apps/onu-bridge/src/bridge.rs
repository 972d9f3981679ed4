//! 由配置装配会话、发布器与轮询器。

use std::sync::Arc;

use onu_config::BridgeConfig;
use onu_poller::{Poller, PollerConfig};
use onu_publish::{MetricPublisher, MetricSink, MqttSinkConfig, PublisherOptions};
use onu_session::{PingProbe, SessionConfig, SessionManager, SshConnector, SshSettings};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn session_manager(config: &BridgeConfig) -> SessionManager {
    let connector = SshConnector::new(SshSettings {
        host: config.host.clone(),
        port: config.port,
        username: config.username.clone(),
        password: config.password.clone(),
    });
    let session_config = SessionConfig {
        target: format!("{}@{}:{}", config.username, config.host, config.port),
        connect_timeout: config.connect_timeout(),
        probe_enabled: config.ping_enabled,
    };
    SessionManager::new(Arc::new(connector), session_config)
        .with_probe(Arc::new(PingProbe::new(config.host.clone())))
}

pub fn poller_config(config: &BridgeConfig) -> PollerConfig {
    PollerConfig {
        poll_interval: config.poll_interval(),
        command_timeout: config.command_timeout(),
        reconnect_threshold: config.reconnect_threshold,
    }
}

pub fn mqtt_config(config: &BridgeConfig) -> MqttSinkConfig {
    MqttSinkConfig {
        host: config.mqtt_host.clone(),
        port: config.mqtt_port,
        username: config.mqtt_username.clone(),
        password: config.mqtt_password.clone(),
        client_id: config.mqtt_client_id.clone(),
        discovery_prefix: config.discovery_prefix.clone(),
        entity_base: config.entity_base.clone(),
    }
}

pub fn build_poller(config: &BridgeConfig, sink: Arc<dyn MetricSink>) -> Poller {
    let publisher = MetricPublisher::new(
        sink,
        PublisherOptions {
            host: config.host.clone(),
            version: VERSION.to_string(),
        },
    );
    Poller::new(session_manager(config), publisher, poller_config(config))
}
