//! Home Assistant 实体目录

use serde::Serialize;

/// 实体类型（决定 topic 中的 component 段）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Sensor,
    BinarySensor,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Sensor => "sensor",
            Component::BinarySensor => "binary_sensor",
        }
    }
}

/// 单个实体的发现元数据。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSpec {
    pub key: &'static str,
    pub name: &'static str,
    pub component: Component,
    pub unit: Option<&'static str>,
    pub device_class: Option<&'static str>,
    pub icon: &'static str,
    pub state_class: Option<&'static str>,
    pub entity_category: Option<&'static str>,
    pub enabled_by_default: bool,
}

impl SensorSpec {
    const fn sensor(key: &'static str, name: &'static str, icon: &'static str) -> Self {
        Self {
            key,
            name,
            component: Component::Sensor,
            unit: None,
            device_class: None,
            icon,
            state_class: None,
            entity_category: None,
            enabled_by_default: true,
        }
    }

    const fn binary(
        key: &'static str,
        name: &'static str,
        device_class: &'static str,
        icon: &'static str,
    ) -> Self {
        Self {
            key,
            name,
            component: Component::BinarySensor,
            unit: None,
            device_class: Some(device_class),
            icon,
            state_class: None,
            entity_category: None,
            enabled_by_default: true,
        }
    }

    const fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    const fn class(mut self, device_class: &'static str) -> Self {
        self.device_class = Some(device_class);
        self
    }

    const fn measurement(mut self) -> Self {
        self.state_class = Some("measurement");
        self
    }

    const fn total_increasing(mut self) -> Self {
        self.state_class = Some("total_increasing");
        self
    }

    const fn diagnostic(mut self) -> Self {
        self.entity_category = Some("diagnostic");
        self
    }

    const fn disabled(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }
}

pub const SSH_CONNECTION_STATUS: &str = "ssh_connection_status";
pub const BRIDGE_UPTIME: &str = "bridge_uptime";

const CATALOG: &[SensorSpec] = &[
    // 光功率
    SensorSpec::sensor("rx_power_dbm", "RX Power", "mdi:access-point")
        .unit("dBm")
        .class("signal_strength")
        .measurement(),
    SensorSpec::sensor("rx_power_mw", "RX Power (mW)", "mdi:access-point")
        .unit("mW")
        .class("power")
        .measurement(),
    SensorSpec::sensor("tx_power_dbm", "TX Power", "mdi:access-point")
        .unit("dBm")
        .class("signal_strength")
        .measurement(),
    SensorSpec::sensor("tx_power_mw", "TX Power (mW)", "mdi:access-point")
        .unit("mW")
        .class("power")
        .measurement(),
    SensorSpec::sensor("voltage", "Voltage", "mdi:flash")
        .unit("V")
        .class("voltage")
        .measurement(),
    SensorSpec::sensor("tx_bias_current", "TX Bias Current", "mdi:current-ac")
        .unit("mA")
        .class("current")
        .measurement(),
    // 温度
    SensorSpec::sensor("optic_temperature", "Optic Temperature", "mdi:thermometer-laser")
        .unit("°C")
        .class("temperature")
        .measurement(),
    SensorSpec::sensor("cpu0_temperature", "CPU0 Temperature", "mdi:chip")
        .unit("°C")
        .class("temperature")
        .measurement(),
    SensorSpec::sensor("cpu1_temperature", "CPU1 Temperature", "mdi:chip")
        .unit("°C")
        .class("temperature")
        .measurement(),
    // 链路
    SensorSpec::binary("pon_link", "PON Link", "connectivity", "mdi:fiber-optic"),
    SensorSpec::binary(SSH_CONNECTION_STATUS, "SSH Connection", "connectivity", "mdi:lan-connect"),
    SensorSpec::sensor("ethernet_speed", "Ethernet Speed", "mdi:ethernet")
        .unit("Mbps")
        .measurement(),
    SensorSpec::sensor("pon_state_name", "PON State", "mdi:state-machine"),
    SensorSpec::sensor("pon_state_code", "PON State Code", "mdi:state-machine").diagnostic(),
    SensorSpec::sensor("pon_previous_state", "PON Previous State", "mdi:history").diagnostic(),
    SensorSpec::sensor("pon_time_in_state", "PON Time in State", "mdi:timer")
        .unit("s")
        .class("duration")
        .measurement()
        .diagnostic(),
    // 设备信息
    SensorSpec::sensor("vendor", "Vendor", "mdi:factory"),
    SensorSpec::sensor("part_number", "Part Number", "mdi:barcode"),
    SensorSpec::sensor("hardware_revision", "Hardware Revision", "mdi:chip"),
    SensorSpec::sensor("serial_number", "Serial Number", "mdi:identifier")
        .diagnostic()
        .disabled(),
    SensorSpec::sensor("pon_mode", "PON Mode", "mdi:wan"),
    SensorSpec::sensor("firmware_bank", "Active Firmware Bank", "mdi:alphabet-latin"),
    SensorSpec::sensor("isp", "ISP", "mdi:web"),
    SensorSpec::sensor("gpon_serial", "GPON Serial", "mdi:identifier")
        .diagnostic()
        .disabled(),
    SensorSpec::sensor("module_type", "Module Type", "mdi:chip").diagnostic(),
    SensorSpec::sensor("pon_vendor_id", "PON Vendor ID", "mdi:identifier").diagnostic(),
    // 系统
    SensorSpec::sensor("onu_uptime", "ONU Uptime", "mdi:timer-outline")
        .unit("s")
        .class("duration")
        .total_increasing()
        .diagnostic(),
    SensorSpec::sensor("memory_percent", "Memory Usage", "mdi:memory")
        .unit("%")
        .measurement()
        .diagnostic(),
    SensorSpec::sensor("memory_used", "Memory Used", "mdi:memory")
        .unit("kB")
        .measurement()
        .diagnostic(),
    // GTC 计数器
    SensorSpec::sensor("gtc_bip_errors", "GTC BIP Errors", "mdi:alert-circle-outline")
        .total_increasing()
        .diagnostic(),
    SensorSpec::sensor("gtc_fec_corrected", "GTC FEC Corrected", "mdi:check-circle-outline")
        .total_increasing()
        .diagnostic(),
    SensorSpec::sensor("gtc_fec_uncorrected", "GTC FEC Uncorrected", "mdi:close-circle-outline")
        .total_increasing()
        .diagnostic(),
    SensorSpec::sensor("gtc_lods_events", "GTC LODS Events", "mdi:signal-off")
        .total_increasing()
        .diagnostic(),
    // 桥接进程
    SensorSpec::sensor(BRIDGE_UPTIME, "Bridge Uptime", "mdi:timer-outline")
        .unit("s")
        .class("duration")
        .total_increasing(),
];

/// 全部实体。
pub fn sensor_catalog() -> &'static [SensorSpec] {
    CATALOG
}

/// 按 key 查找实体。
pub fn find_sensor(key: &str) -> Option<&'static SensorSpec> {
    CATALOG.iter().find(|spec| spec.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_unique() {
        let keys: HashSet<_> = sensor_catalog().iter().map(|spec| spec.key).collect();
        assert_eq!(keys.len(), sensor_catalog().len());
    }

    #[test]
    fn test_binary_sensors() {
        let binaries: Vec<_> = sensor_catalog()
            .iter()
            .filter(|spec| spec.component == Component::BinarySensor)
            .map(|spec| spec.key)
            .collect();
        assert_eq!(binaries, vec!["pon_link", SSH_CONNECTION_STATUS]);
    }

    #[test]
    fn test_sensitive_sensors_disabled() {
        assert!(!find_sensor("gpon_serial").unwrap().enabled_by_default);
        assert!(find_sensor("rx_power_dbm").unwrap().enabled_by_default);
    }
}
