use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::catalog::{Component, SensorSpec};
use crate::device::DeviceDescriptor;
use crate::error::PublishError;

/// 单个实体的一次状态写入。
#[derive(Debug, Clone, PartialEq)]
pub struct MetricWrite {
    pub component: Component,
    pub key: String,
    pub state: String,
    pub attributes: Map<String, Value>,
}

/// 指标下游抽象。
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// 发布设备及其实体的发现配置。
    async fn announce(
        &self,
        device: &DeviceDescriptor,
        sensors: &[SensorSpec],
    ) -> Result<(), PublishError>;

    /// 写入状态与属性。
    async fn write(&self, device_id: &str, write: &MetricWrite) -> Result<(), PublishError>;
}

/// 空下游（用于诊断模式与测试）。
#[derive(Debug, Default)]
pub struct NoopSink;

#[async_trait]
impl MetricSink for NoopSink {
    async fn announce(
        &self,
        _device: &DeviceDescriptor,
        _sensors: &[SensorSpec],
    ) -> Result<(), PublishError> {
        Ok(())
    }

    async fn write(&self, _device_id: &str, _write: &MetricWrite) -> Result<(), PublishError> {
        Ok(())
    }
}
