use serde::Serialize;

use crate::format::round_to;

/// 指标值的数据类型。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    I64(i64),
    F64(f64),
    Bool(bool),
    Text(String),
}

impl MetricValue {
    /// 发布到 MQTT state topic 的文本形式。
    pub fn to_payload(&self) -> String {
        match self {
            MetricValue::I64(value) => value.to_string(),
            MetricValue::F64(value) => value.to_string(),
            MetricValue::Bool(value) => value.to_string(),
            MetricValue::Text(value) => value.clone(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::I64(value) => Some(*value as f64),
            MetricValue::F64(value) => Some(*value),
            _ => None,
        }
    }
}

/// 实时光学诊断（EEPROM51，A2h 页）。
#[derive(Debug, Clone, PartialEq)]
pub struct OpticalDiagnostics {
    /// 光模块温度（°C）
    pub temperature: f64,
    /// 供电电压（V）
    pub voltage: f64,
    /// 激光偏置电流（mA）
    pub tx_bias: f64,
    pub tx_power_mw: f64,
    pub tx_power_dbm: f64,
    pub rx_power_mw: f64,
    pub rx_power_dbm: f64,
}

/// 设备身份（EEPROM50，A0h 页）。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceIdentity {
    pub vendor: String,
    pub part_number: String,
    pub revision: String,
    /// 页长度不足 84 字节时缺失
    pub serial_number: Option<String>,
}

/// PON 链路状态（`pon psg` 输出）。
#[derive(Debug, Clone, PartialEq)]
pub struct LinkState {
    pub state_code: u32,
    pub previous_code: Option<u32>,
    pub time_in_state: Option<u64>,
}

impl LinkState {
    pub fn state_name(&self) -> String {
        crate::pon::pon_state_name(self.state_code)
    }

    pub fn previous_name(&self) -> Option<String> {
        self.previous_code.map(crate::pon::pon_state_name)
    }

    pub fn link_up(&self) -> bool {
        crate::pon::is_operational(self.state_code)
    }
}

/// 内存占用（`free` 的 Mem 行，单位 kB）。
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl MemoryUsage {
    /// 占用百分比（1 位小数），total 为 0 时不计算。
    pub fn percent(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(round_to(self.used as f64 / self.total as f64 * 100.0, 1))
    }
}

/// GTC 层帧计数器（单调递增）。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GtcCounters {
    pub bip_errors: Option<u64>,
    pub fec_corrected: Option<u64>,
    pub fec_uncorrected: Option<u64>,
    pub lods_events: Option<u64>,
}

impl GtcCounters {
    pub fn is_empty(&self) -> bool {
        self.bip_errors.is_none()
            && self.fec_corrected.is_none()
            && self.fec_uncorrected.is_none()
            && self.lods_events.is_none()
    }
}

/// 系统计数器。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemCounters {
    pub uptime_secs: Option<u64>,
    pub memory: Option<MemoryUsage>,
    /// 按 thermal_zone 顺序
    pub cpu_temps: Vec<f64>,
    /// Mbps，0 表示无链路
    pub ethernet_speed: Option<u32>,
    pub gtc: GtcCounters,
}

/// 设备配置类文本信息（uci / 8311 脚本输出）。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceProfile {
    pub pon_mode: Option<String>,
    pub firmware_bank: Option<String>,
    pub gpon_serial: Option<String>,
    pub module_type: Option<String>,
    pub pon_vendor_id: Option<String>,
}

impl DeviceProfile {
    /// 由 GPON 序列号推断运营商。
    pub fn isp(&self) -> Option<&'static str> {
        self.gpon_serial.as_deref().map(crate::isp::detect_isp)
    }
}

/// 单个轮询周期合并后的指标记录，所有字段均可缺失。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsRecord {
    pub optical: Option<OpticalDiagnostics>,
    pub identity: Option<DeviceIdentity>,
    pub link: Option<LinkState>,
    pub system: SystemCounters,
    pub profile: DeviceProfile,
}

/// 展开后的单个指标：稳定 key + 值 + 来源段。
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEntry {
    pub key: &'static str,
    pub value: MetricValue,
    pub source: &'static str,
}

impl MetricEntry {
    fn new(key: &'static str, value: MetricValue, source: &'static str) -> Self {
        Self { key, value, source }
    }
}

impl MetricsRecord {
    /// 是否没有任何字段。
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// 按稳定 key 展开为指标列表（只包含本周期存在的字段）。
    pub fn entries(&self) -> Vec<MetricEntry> {
        use MetricValue::{Bool, F64, I64, Text};

        let mut out = Vec::new();

        if let Some(optical) = &self.optical {
            let source = "eeprom51";
            out.push(MetricEntry::new("rx_power_dbm", F64(optical.rx_power_dbm), source));
            out.push(MetricEntry::new("rx_power_mw", F64(optical.rx_power_mw), source));
            out.push(MetricEntry::new("tx_power_dbm", F64(optical.tx_power_dbm), source));
            out.push(MetricEntry::new("tx_power_mw", F64(optical.tx_power_mw), source));
            out.push(MetricEntry::new("voltage", F64(optical.voltage), source));
            out.push(MetricEntry::new("tx_bias_current", F64(optical.tx_bias), source));
            out.push(MetricEntry::new("optic_temperature", F64(optical.temperature), source));
        }

        if let Some(identity) = &self.identity {
            let source = "eeprom50";
            out.push(MetricEntry::new("vendor", Text(identity.vendor.clone()), source));
            out.push(MetricEntry::new("part_number", Text(identity.part_number.clone()), source));
            out.push(MetricEntry::new(
                "hardware_revision",
                Text(identity.revision.clone()),
                source,
            ));
            if let Some(serial) = &identity.serial_number {
                out.push(MetricEntry::new("serial_number", Text(serial.clone()), source));
            }
        }

        if let Some(link) = &self.link {
            let source = "pon_status";
            out.push(MetricEntry::new("pon_link", Bool(link.link_up()), source));
            out.push(MetricEntry::new("pon_state_code", I64(link.state_code as i64), source));
            out.push(MetricEntry::new("pon_state_name", Text(link.state_name()), source));
            if let Some(previous) = link.previous_name() {
                out.push(MetricEntry::new("pon_previous_state", Text(previous), source));
            }
            if let Some(secs) = link.time_in_state {
                out.push(MetricEntry::new("pon_time_in_state", I64(secs as i64), source));
            }
        }

        let system = &self.system;
        for (index, key) in ["cpu0_temperature", "cpu1_temperature"].into_iter().enumerate() {
            if let Some(temp) = system.cpu_temps.get(index) {
                out.push(MetricEntry::new(key, F64(*temp), "cpu_temps"));
            }
        }
        if let Some(speed) = system.ethernet_speed {
            out.push(MetricEntry::new("ethernet_speed", I64(speed as i64), "eth_speed"));
        }
        if let Some(uptime) = system.uptime_secs {
            out.push(MetricEntry::new("onu_uptime", I64(uptime as i64), "system_info"));
        }
        if let Some(memory) = &system.memory {
            if let Some(percent) = memory.percent() {
                out.push(MetricEntry::new("memory_percent", F64(percent), "system_info"));
            }
            out.push(MetricEntry::new("memory_used", I64(memory.used as i64), "system_info"));
        }
        let gtc = [
            ("gtc_bip_errors", system.gtc.bip_errors),
            ("gtc_fec_corrected", system.gtc.fec_corrected),
            ("gtc_fec_uncorrected", system.gtc.fec_uncorrected),
            ("gtc_lods_events", system.gtc.lods_events),
        ];
        for (key, value) in gtc {
            if let Some(value) = value {
                out.push(MetricEntry::new(key, I64(value as i64), "gtc_counters"));
            }
        }

        let profile = &self.profile;
        let texts = [
            ("pon_mode", &profile.pon_mode, "pon_mode"),
            ("firmware_bank", &profile.firmware_bank, "fw_bank"),
            ("gpon_serial", &profile.gpon_serial, "gpon_serial"),
            ("module_type", &profile.module_type, "module_type"),
            ("pon_vendor_id", &profile.pon_vendor_id, "vendor_id"),
        ];
        for (key, value, source) in texts {
            if let Some(value) = value {
                out.push(MetricEntry::new(key, Text(value.clone()), source));
            }
        }
        if let Some(isp) = profile.isp() {
            out.push(MetricEntry::new("isp", Text(isp.to_string()), "gpon_serial"));
        }

        out
    }

    /// 查找单个指标值。
    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.entries()
            .into_iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value)
    }
}
