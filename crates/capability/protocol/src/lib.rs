//! # ONU 数据解码能力模块
//!
//! 把一次组合命令的原始输出解码为 [`domain::MetricsRecord`]：
//! - **组合命令**：[`CommandComposer`] 把各子命令拼成单行 shell
//! - **分段**：[`split_sections`] 按 `---NAME---` 哨兵行切分
//! - **字节页**：EEPROM50 / EEPROM51 按固定偏移字段表解码
//! - **状态文本**：`key=value` 与逐行格式
//!
//! ## 数据流
//!
//! ```text
//! CommandComposer::compose()
//!       │  (SSH 单次往返)
//!       ▼
//! split_sections(stdout)
//!       │
//!       ├── EEPROM51 ─ decode_base64_page → decode_diagnostics
//!       ├── EEPROM50 ─ decode_base64_page → decode_identity
//!       ├── PON_STATUS / GTC_COUNTERS ─ key=value
//!       └── CPU_TEMPS / ETH_SPEED / SYSTEM_INFO / uci 文本
//!       │
//!       ▼
//! assemble_record → MetricsRecord
//! ```
//!
//! 任一段解码失败只丢弃该段（debug 日志 + 计数），不会 panic。

pub mod command;
mod eeprom;
mod error;
mod record;
mod sections;
mod text;
mod types;

pub use command::{CommandComposer, SectionCommand, default_sections};
pub use eeprom::{
    DBM_FLOOR, DIAGNOSTICS_MIN_LEN, IDENTITY_MIN_LEN, decode_base64_page, decode_diagnostics,
    decode_identity, decode_page, watts_to_dbm,
};
pub use error::DecodeError;
pub use record::{assemble_record, decode_reply};
pub use sections::{Sections, TERMINAL_SECTION, sentinel, sentinel_name, split_sections};
pub use text::{
    PLACEHOLDER, is_placeholder, key_values, normalize_pon_mode, parse_cpu_temps,
    parse_ethernet_speed, parse_gtc_counters, parse_link_state, parse_system_info,
    parse_text_value,
};
pub use types::*;
