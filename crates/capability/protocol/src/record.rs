//! 分段输出 → 指标记录
//!
//! 每段独立解码：某段缺失、为兜底占位或解码失败时只丢弃该段，
//! 其余字段照常产出。

use domain::{MetricsRecord, SystemCounters};
use tracing::debug;

use crate::command::{
    CPU_TEMPS, CommandComposer, EEPROM50, EEPROM51, ETH_SPEED, FW_BANK, GPON_SERIAL, GTC_COUNTERS,
    MODULE_TYPE, PON_MODE, PON_STATUS, SYSTEM_INFO, VENDOR_ID,
};
use crate::eeprom::{decode_base64_page, decode_diagnostics, decode_identity};
use crate::error::DecodeError;
use crate::sections::{Sections, split_sections};
use crate::text::{
    is_placeholder, normalize_pon_mode, parse_cpu_temps, parse_ethernet_speed, parse_gtc_counters,
    parse_link_state, parse_system_info, parse_text_value,
};

/// 取出非占位段文本。
fn section<'a>(sections: &'a Sections, name: &str) -> Option<&'a str> {
    sections.get(name).filter(|text| !is_placeholder(text))
}

/// 解码失败只记录，不向上传播。
fn decoded<T>(name: &str, result: Result<T, DecodeError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            onu_telemetry::record_decode_failure();
            debug!(target: "onu.protocol", section = name, error = %err, "section_decode_failed");
            None
        }
    }
}

/// 合并各段为一条记录。
pub fn assemble_record(sections: &Sections) -> MetricsRecord {
    let mut record = MetricsRecord::default();

    if let Some(text) = section(sections, EEPROM51) {
        record.optical = decoded(
            EEPROM51,
            decode_base64_page(text).and_then(|bytes| decode_diagnostics(&bytes)),
        );
    }
    if let Some(text) = section(sections, EEPROM50) {
        record.identity = decoded(
            EEPROM50,
            decode_base64_page(text).and_then(|bytes| decode_identity(&bytes)),
        );
    }
    if let Some(text) = section(sections, PON_STATUS) {
        record.link = decoded(PON_STATUS, parse_link_state(text));
    }

    let mut system = SystemCounters::default();
    if let Some(text) = section(sections, CPU_TEMPS) {
        system.cpu_temps = parse_cpu_temps(text);
    }
    if let Some(text) = section(sections, ETH_SPEED) {
        system.ethernet_speed = decoded(ETH_SPEED, parse_ethernet_speed(text));
    }
    if let Some(text) = section(sections, SYSTEM_INFO) {
        let (uptime, memory) = parse_system_info(text);
        system.uptime_secs = uptime;
        system.memory = memory;
    }
    if let Some(text) = section(sections, GTC_COUNTERS) {
        system.gtc = parse_gtc_counters(text);
    }
    record.system = system;

    let text_of = |name: &str| sections.get(name).and_then(parse_text_value);
    record.profile.firmware_bank = text_of(FW_BANK);
    record.profile.pon_mode = text_of(PON_MODE).map(|mode| normalize_pon_mode(&mode));
    record.profile.gpon_serial = text_of(GPON_SERIAL);
    record.profile.module_type = text_of(MODULE_TYPE);
    record.profile.pon_vendor_id = text_of(VENDOR_ID);

    record
}


/// 校验并解码一次组合命令的输出。
///
/// 缺少终止哨兵，或没有任何一个预期段时，整次输出视为无效。
pub fn decode_reply(
    output: &str,
    composer: &CommandComposer,
) -> Result<MetricsRecord, DecodeError> {
    let sections = split_sections(output);
    if !sections.is_terminated() {
        return Err(DecodeError::MalformedReply(format!(
            "no terminal sentinel in {} bytes of output",
            output.len()
        )));
    }
    let known = composer
        .sections()
        .iter()
        .filter(|command| sections.contains(&command.name))
        .count();
    if known == 0 {
        return Err(DecodeError::MalformedReply(
            "none of the expected sections present".to_string(),
        ));
    }
    Ok(assemble_record(&sections))
}
