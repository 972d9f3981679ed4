//! 桥接进程运行配置加载。

use std::env;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 桥接进程运行配置。
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub poll_interval_seconds: u64,
    pub command_timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    /// 连续失败达到该次数后触发带外重连
    pub reconnect_threshold: u32,
    /// 建连前先 ping 一次
    pub ping_enabled: bool,
    /// 单次诊断模式：跑一个周期、打印结果后退出
    pub test_mode: bool,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_client_id: String,
    pub discovery_prefix: String,
    pub entity_base: String,
}

impl BridgeConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("ONU_HOST").unwrap_or_else(|_| "192.168.11.1".to_string());
        let port = read_u16_with_default("ONU_PORT", 22)?;
        let username = env::var("ONU_USERNAME").unwrap_or_else(|_| "root".to_string());
        let password = env::var("ONU_PASSWORD").unwrap_or_default();
        let poll_interval_seconds = read_positive_u64("ONU_POLL_INTERVAL_SECONDS", 60)?;
        let command_timeout_seconds = read_positive_u64("ONU_COMMAND_TIMEOUT_SECONDS", 10)?;
        let connect_timeout_seconds = read_positive_u64("ONU_CONNECT_TIMEOUT_SECONDS", 10)?;
        let reconnect_threshold = read_positive_u64("ONU_RECONNECT_THRESHOLD", 3)?;
        let reconnect_threshold = u32::try_from(reconnect_threshold).map_err(|_| {
            ConfigError::Invalid(
                "ONU_RECONNECT_THRESHOLD".to_string(),
                reconnect_threshold.to_string(),
            )
        })?;
        let ping_enabled = read_bool_with_default("ONU_PING_ENABLED", false);
        let test_mode = read_bool_with_default("ONU_TEST_MODE", false);
        let mqtt_host =
            env::var("ONU_MQTT_HOST").unwrap_or_else(|_| "homeassistant.local".to_string());
        let mqtt_port = read_u16_with_default("ONU_MQTT_PORT", 1883)?;
        let mqtt_username = read_optional("ONU_MQTT_USERNAME");
        let mqtt_password = read_optional("ONU_MQTT_PASSWORD");
        let mqtt_client_id =
            env::var("ONU_MQTT_CLIENT_ID").unwrap_or_else(|_| "8311-ha-bridge".to_string());
        let discovery_prefix = env::var("ONU_DISCOVERY_PREFIX")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "homeassistant".to_string());
        let entity_base = env::var("ONU_ENTITY_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "8311".to_string());

        Ok(Self {
            host,
            port,
            username,
            password,
            poll_interval_seconds,
            command_timeout_seconds,
            connect_timeout_seconds,
            reconnect_threshold,
            ping_enabled,
            test_mode,
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_client_id,
            discovery_prefix,
            entity_base,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

/// 间隔、超时、阈值不允许为 0。
fn read_positive_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match read_u64_with_default(key, default)? {
        0 => Err(ConfigError::Invalid(key.to_string(), "0".to_string())),
        value => Ok(value),
    }
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
