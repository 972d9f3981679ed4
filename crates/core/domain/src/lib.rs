//! ONU 监控领域模型：所有能力模块共享的数据结构与静态查找表。

pub mod data;
pub mod format;
pub mod isp;
pub mod pon;
pub mod stats;

pub use data::{
    DeviceIdentity, DeviceProfile, GtcCounters, LinkState, MemoryUsage, MetricEntry, MetricValue,
    MetricsRecord, OpticalDiagnostics, SystemCounters,
};
pub use isp::detect_isp;
pub use pon::{is_operational, pon_state_name};
pub use stats::{BridgeRunStats, DURATION_WINDOW};
