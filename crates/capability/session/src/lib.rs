//! # ONU 远程会话能力模块
//!
//! ```text
//! SessionManager
//!       │  ensure_connected / run / reconnect / disconnect
//!       ├── ReachabilityProbe (PingProbe，可选)
//!       └── ShellConnector ── SshConnector (libssh2)
//!                 │
//!                 ▼
//!           ShellConnection (单条已认证会话，跨周期复用)
//! ```
//!
//! 错误分两类：认证失败（锁存）与瞬时传输错误（下个周期重建连接）。

mod error;
mod manager;
mod probe;
mod ssh;
mod transport;

pub use error::SessionError;
pub use manager::{SessionConfig, SessionManager};
pub use probe::PingProbe;
pub use ssh::{SshConnection, SshConnector, SshSettings};
pub use transport::{ReachabilityProbe, ShellConnection, ShellConnector};
