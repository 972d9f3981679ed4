//! # ONU 指标发布能力模块
//!
//! ```text
//! MetricPublisher::publish_cycle(record, stats)
//!       │
//!       ├── 设备 ID 变化 → MetricSink::announce（自动发现，retain）
//!       └── 每个字段 → MetricSink::write（state + attributes）
//!                 │
//!                 ├── MqttSink（rumqttc）
//!                 └── NoopSink
//! ```
//!
//! topic 布局：
//! - 发现：`{discovery_prefix}/{component}/{device_id}/{key}/config`
//! - 状态：`{entity_base}/{component}/{device_id}/{key}/state`
//! - 属性：`{entity_base}/{component}/{device_id}/{key}/attributes`

mod catalog;
mod device;
mod error;
mod mqtt;
mod publisher;
mod sink;

pub use catalog::{
    BRIDGE_UPTIME, Component, SSH_CONNECTION_STATUS, SensorSpec, find_sensor, sensor_catalog,
};
pub use device::{DeviceDescriptor, TopicLayout, sanitize_for_topic};
pub use error::PublishError;
pub use mqtt::{MqttSink, MqttSinkConfig};
pub use publisher::{MetricPublisher, PublishSummary, PublisherOptions, metric_writes};
pub use sink::{MetricSink, MetricWrite, NoopSink};
