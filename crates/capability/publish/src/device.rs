//! 设备描述与 topic 构造

use domain::{DeviceIdentity, DeviceProfile};
use serde_json::{Map, Value, json};

use crate::catalog::SensorSpec;

const DEFAULT_MANUFACTURER: &str = "BFW Solutions";
const DEFAULT_MODEL: &str = "WAS-110";

/// topic 段清洗：`.` `/` → `_`，去掉通配符 `#` `+`，其余非 `[A-Za-z0-9_-]` → `_`，转小写。
pub fn sanitize_for_topic(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '#' && *c != '+')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// 设备描述（Home Assistant device 块）。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub device_id: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: String,
    pub configuration_url: String,
}

impl DeviceDescriptor {
    /// 由身份信息构造。料号缺失时退化为 `WAS110_unknown`。
    pub fn new(identity: Option<&DeviceIdentity>, profile: &DeviceProfile, host: &str) -> Self {
        let part_number = identity
            .map(|identity| identity.part_number.as_str())
            .filter(|part| !part.is_empty());
        let prefix: String = part_number.unwrap_or("unknown").chars().take(6).collect();
        let serial = format!("WAS110_{prefix}");

        let sw_version = match &profile.firmware_bank {
            Some(bank) => format!("8311 Community (Bank {bank})"),
            None => "8311 Community".to_string(),
        };

        Self {
            device_id: format!("8311_onu_{}", sanitize_for_topic(&serial)),
            name: format!("8311 ONU ({serial})"),
            manufacturer: identity
                .map(|identity| identity.vendor.clone())
                .filter(|vendor| !vendor.is_empty())
                .unwrap_or_else(|| DEFAULT_MANUFACTURER.to_string()),
            model: part_number.unwrap_or(DEFAULT_MODEL).to_string(),
            sw_version,
            configuration_url: format!("https://{host}"),
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "identifiers": [self.device_id],
            "name": self.name,
            "manufacturer": self.manufacturer,
            "model": self.model,
            "sw_version": self.sw_version,
            "via_device": "8311-ha-bridge",
            "configuration_url": self.configuration_url,
        })
    }
}

/// topic 前缀
#[derive(Debug, Clone)]
pub struct TopicLayout {
    pub discovery_prefix: String,
    pub entity_base: String,
}

impl TopicLayout {
    fn entity_topic(&self, component: &str, device_id: &str, key: &str, leaf: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.entity_base, component, device_id, key, leaf
        )
    }

    pub fn state_topic(&self, component: &str, device_id: &str, key: &str) -> String {
        self.entity_topic(component, device_id, key, "state")
    }

    pub fn attributes_topic(&self, component: &str, device_id: &str, key: &str) -> String {
        self.entity_topic(component, device_id, key, "attributes")
    }

    pub fn discovery_topic(&self, component: &str, device_id: &str, key: &str) -> String {
        format!(
            "{}/{}/{}/{}/config",
            self.discovery_prefix, component, device_id, key
        )
    }

    /// 单个实体的自动发现配置。
    pub fn discovery_config(&self, device: &DeviceDescriptor, spec: &SensorSpec) -> Value {
        let component = spec.component.as_str();
        let mut config = Map::new();
        config.insert("name".into(), json!(spec.name));
        config.insert(
            "unique_id".into(),
            json!(format!("{}_{}", device.device_id, spec.key)),
        );
        config.insert(
            "state_topic".into(),
            json!(self.state_topic(component, &device.device_id, spec.key)),
        );
        config.insert(
            "json_attributes_topic".into(),
            json!(self.attributes_topic(component, &device.device_id, spec.key)),
        );
        config.insert("icon".into(), json!(spec.icon));
        config.insert("device".into(), device.to_json());

        if spec.component == crate::catalog::Component::BinarySensor {
            config.insert("payload_on".into(), json!("ON"));
            config.insert("payload_off".into(), json!("OFF"));
        }
        let optional = [
            ("unit_of_measurement", spec.unit),
            ("device_class", spec.device_class),
            ("state_class", spec.state_class),
            ("entity_category", spec.entity_category),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                config.insert(name.into(), json!(value));
            }
        }
        if !spec.enabled_by_default {
            config.insert("enabled_by_default".into(), json!(false));
        }
        Value::Object(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_sensor;

    fn layout() -> TopicLayout {
        TopicLayout {
            discovery_prefix: "homeassistant".to_string(),
            entity_base: "8311".to_string(),
        }
    }

    #[test]
    fn test_sanitize_for_topic() {
        assert_eq!(sanitize_for_topic("WAS110_XGS.PO/N"), "was110_xgs_po_n");
        assert_eq!(sanitize_for_topic("a#b+c d"), "abc_d");
    }

    #[test]
    fn test_device_id_from_part_number() {
        let identity = DeviceIdentity {
            vendor: "OEM".to_string(),
            part_number: "XGSPONST2001".to_string(),
            ..DeviceIdentity::default()
        };
        let profile = DeviceProfile {
            firmware_bank: Some("A".to_string()),
            ..DeviceProfile::default()
        };
        let device = DeviceDescriptor::new(Some(&identity), &profile, "192.168.11.1");
        assert_eq!(device.device_id, "8311_onu_was110_xgspon");
        assert_eq!(device.manufacturer, "OEM");
        assert_eq!(device.sw_version, "8311 Community (Bank A)");
        assert_eq!(device.configuration_url, "https://192.168.11.1");
    }

    #[test]
    fn test_device_without_identity() {
        let device = DeviceDescriptor::new(None, &DeviceProfile::default(), "onu");
        assert_eq!(device.device_id, "8311_onu_was110_unknow");
        assert_eq!(device.manufacturer, DEFAULT_MANUFACTURER);
        assert_eq!(device.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_discovery_config() {
        let device = DeviceDescriptor::new(None, &DeviceProfile::default(), "onu");
        let layout = layout();

        let config = layout.discovery_config(&device, find_sensor("rx_power_dbm").unwrap());
        assert_eq!(config["unit_of_measurement"], "dBm");
        assert_eq!(
            config["state_topic"],
            "8311/sensor/8311_onu_was110_unknow/rx_power_dbm/state"
        );
        assert!(config.get("enabled_by_default").is_none());

        let config = layout.discovery_config(&device, find_sensor("pon_link").unwrap());
        assert_eq!(config["payload_on"], "ON");
        assert_eq!(
            layout.discovery_topic("binary_sensor", &device.device_id, "pon_link"),
            "homeassistant/binary_sensor/8311_onu_was110_unknow/pon_link/config"
        );

        let config = layout.discovery_config(&device, find_sensor("gpon_serial").unwrap());
        assert_eq!(config["enabled_by_default"], false);
        assert_eq!(config["entity_category"], "diagnostic");
    }
}
