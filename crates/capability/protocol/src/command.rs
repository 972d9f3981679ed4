//! 组合命令构造
//!
//! 一个周期只走一次 SSH 往返：所有子命令拼成一行 shell，
//! 每段前输出哨兵行，每个子命令自带 stderr 重定向与兜底输出，
//! 单个子命令失败不会中断后续段。

use crate::sections::{TERMINAL_SECTION, sentinel};
use crate::text::PLACEHOLDER;

pub const EEPROM50: &str = "EEPROM50";
pub const EEPROM51: &str = "EEPROM51";
pub const PON_STATUS: &str = "PON_STATUS";
pub const CPU_TEMPS: &str = "CPU_TEMPS";
pub const ETH_SPEED: &str = "ETH_SPEED";
pub const FW_BANK: &str = "FW_BANK";
pub const PON_MODE: &str = "PON_MODE";
pub const GPON_SERIAL: &str = "GPON_SERIAL";
pub const MODULE_TYPE: &str = "MODULE_TYPE";
pub const VENDOR_ID: &str = "VENDOR_ID";
pub const SYSTEM_INFO: &str = "SYSTEM_INFO";
pub const GTC_COUNTERS: &str = "GTC_COUNTERS";

/// 单个子命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCommand {
    pub name: String,
    pub command: String,
    /// 子命令失败时输出的文本
    pub fallback: String,
}

impl SectionCommand {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            fallback: PLACEHOLDER.to_string(),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    fn render(&self) -> String {
        format!(
            "echo '{}' && ( {} ) 2>/dev/null || echo {}",
            sentinel(&self.name),
            self.command,
            self.fallback
        )
    }
}

/// WAS-110 固件的默认段。路径与固件版本相关，可整体替换。
pub fn default_sections() -> Vec<SectionCommand> {
    vec![
        SectionCommand::new(
            EEPROM50,
            "cat /sys/class/pon_mbox/pon_mbox0/device/eeprom50 | base64",
        ),
        SectionCommand::new(
            EEPROM51,
            "cat /sys/class/pon_mbox/pon_mbox0/device/eeprom51 | base64",
        ),
        SectionCommand::new(PON_STATUS, "pon psg"),
        SectionCommand::new(CPU_TEMPS, "cat /sys/class/thermal/thermal_zone*/temp"),
        SectionCommand::new(ETH_SPEED, "cat /sys/class/net/eth0_0/speed"),
        SectionCommand::new(FW_BANK, ". /lib/8311.sh && active_fwbank"),
        SectionCommand::new(PON_MODE, "uci get gpon.ponip.pon_mode"),
        SectionCommand::new(GPON_SERIAL, "uci get gpon.ploam.nSerial"),
        SectionCommand::new(MODULE_TYPE, ". /lib/8311.sh && get_8311_module_type"),
        SectionCommand::new(VENDOR_ID, ". /lib/8311.sh && get_8311_vendor_id"),
        SectionCommand::new(SYSTEM_INFO, "cat /proc/uptime && free | grep Mem"),
        SectionCommand::new(GTC_COUNTERS, "pon gtc_counters_get"),
    ]
}

/// 组合命令构造器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandComposer {
    sections: Vec<SectionCommand>,
}

impl Default for CommandComposer {
    fn default() -> Self {
        Self::new(default_sections())
    }
}

impl CommandComposer {
    pub fn new(sections: Vec<SectionCommand>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[SectionCommand] {
        &self.sections
    }

    /// 拼接为单行命令，最后输出终止哨兵。
    pub fn compose(&self) -> String {
        let mut parts: Vec<String> = self.sections.iter().map(SectionCommand::render).collect();
        parts.push(format!("echo '{}'", sentinel(TERMINAL_SECTION)));
        parts.join(" && ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_single_section() {
        let composer = CommandComposer::new(vec![SectionCommand::new("A", "cat /a")]);
        assert_eq!(
            composer.compose(),
            "echo '---A---' && ( cat /a ) 2>/dev/null || echo unknown && echo '---END---'"
        );
    }

    #[test]
    fn test_every_section_has_own_fallback() {
        let composer = CommandComposer::default();
        let line = composer.compose();
        let names: Vec<&str> = composer.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), 12);
        for name in names {
            assert!(line.contains(&format!("echo '---{name}---' && (")));
        }
        assert_eq!(line.matches("2>/dev/null || echo unknown").count(), 12);
        assert!(line.ends_with("echo '---END---'"));
    }

    #[test]
    fn test_custom_fallback() {
        let composer =
            CommandComposer::new(vec![SectionCommand::new("X", "false").with_fallback("0")]);
        assert!(composer.compose().contains("( false ) 2>/dev/null || echo 0"));
    }
}
