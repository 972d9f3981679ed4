//! # ONU 轮询能力模块
//!
//! 单个 [`Poller`] 持有全部可变状态（会话、统计、身份缓存），
//! 提供两种驱动方式：
//! - [`Poller::run`]：独立定时循环，直到 `CancellationToken` 触发
//! - [`Poller::poll_once`]：单次刷新（诊断模式或外部调度）
//!
//! ```text
//! tick → compose → SessionManager::run
//!          ├── 成功 → split/校验/decode → stats.record_success → publish
//!          └── 失败或输出无效 → stats.record_failure → (连续失败 ≥ 阈值) reconnect → publish(health=OFF)
//! ```

mod poller;

pub use poller::{CycleError, CycleOutcome, Poller, PollerConfig};
