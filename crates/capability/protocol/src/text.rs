//! 状态命令文本解析
//!
//! - `pon psg`：`errorcode=0 current=51 previous=40 time_curr=297761`
//! - `pon gtc_counters_get`：`errorcode=0 bip_errors=0 ... fec_codewords_corr=0 ...`
//! - `/proc/uptime` + `free | grep Mem`
//! - `thermal_zone*/temp`、`/sys/class/net/*/speed`、uci 文本值

use domain::format::round_to;
use domain::{GtcCounters, LinkState, MemoryUsage};
use tracing::debug;

use crate::error::DecodeError;

/// 命令失败时的兜底输出
pub const PLACEHOLDER: &str = "unknown";

/// 按空白切分，每个 token 在第一个 `=` 处拆成键值；无 `=` 的 token 忽略。
pub fn key_values(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DecodeError> {
    value.parse::<T>().map_err(|_| DecodeError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// 逐键解析，非数字值只跳过该键。
fn int_fields<'a>(
    text: &'a str,
    wanted: &'a [&'a str],
) -> impl Iterator<Item = (&'a str, u64)> {
    key_values(text)
        .filter(|(key, _)| wanted.contains(key))
        .filter_map(|(key, value)| match parse_int::<u64>(key, value) {
            Ok(parsed) => Some((key, parsed)),
            Err(err) => {
                debug!(target: "onu.protocol", error = %err, "key_value_skipped");
                None
            }
        })
}

/// 解析 `pon psg` 输出。缺少有效 `current` 时整体无效。
pub fn parse_link_state(text: &str) -> Result<LinkState, DecodeError> {
    let mut state_code = None;
    let mut previous_code = None;
    let mut time_in_state = None;

    for (key, value) in int_fields(text, &["current", "previous", "time_curr"]) {
        match key {
            "current" => state_code = u32::try_from(value).ok(),
            "previous" => previous_code = u32::try_from(value).ok(),
            "time_curr" => time_in_state = Some(value),
            _ => {}
        }
    }

    Ok(LinkState {
        state_code: state_code.ok_or(DecodeError::MissingField("current"))?,
        previous_code,
        time_in_state,
    })
}

/// 解析 `pon gtc_counters_get` 输出。
pub fn parse_gtc_counters(text: &str) -> GtcCounters {
    let mut counters = GtcCounters::default();
    let wanted = [
        "bip_errors",
        "fec_codewords_corr",
        "fec_codewords_uncorr",
        "lods_events",
    ];
    for (key, value) in int_fields(text, &wanted) {
        match key {
            "bip_errors" => counters.bip_errors = Some(value),
            "fec_codewords_corr" => counters.fec_corrected = Some(value),
            "fec_codewords_uncorr" => counters.fec_uncorrected = Some(value),
            "lods_events" => counters.lods_events = Some(value),
            _ => {}
        }
    }
    counters
}

/// 每行一个 thermal_zone 读数（毫摄氏度），转为摄氏度保留 1 位小数。
pub fn parse_cpu_temps(text: &str) -> Vec<f64> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|line| line.parse::<u64>().ok())
        .map(|millis| round_to(millis as f64 / 1000.0, 1))
        .collect()
}

/// 网口速率（Mbps）。内核在无链路时报告 -1，归一为 0。
pub fn parse_ethernet_speed(text: &str) -> Result<u32, DecodeError> {
    let value = text.trim();
    let speed = parse_int::<i64>("speed", value)?;
    Ok(u32::try_from(speed.max(0)).unwrap_or(u32::MAX))
}

/// 解析 `/proc/uptime` 与 `free` 的 Mem 行。
pub fn parse_system_info(text: &str) -> (Option<u64>, Option<MemoryUsage>) {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let uptime = lines
        .next()
        .and_then(|line| line.split_whitespace().next())
        .and_then(|first| first.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| secs as u64);

    let memory = text
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("Mem"))
        .and_then(parse_memory_line);

    (uptime, memory)
}

/// `Mem:  total  used  free  shared  buff/cache  available`
fn parse_memory_line(line: &str) -> Option<MemoryUsage> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return None;
    }
    let field = |index: usize| parts[index].parse::<u64>().ok();
    Some(MemoryUsage {
        total: field(1)?,
        used: field(2)?,
        free: field(3)?,
    })
}

/// 是否为兜底占位输出。
pub fn is_placeholder(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text.eq_ignore_ascii_case(PLACEHOLDER)
}

/// uci / 脚本输出的单值文本，占位值视为缺失。
pub fn parse_text_value(text: &str) -> Option<String> {
    if is_placeholder(text) {
        return None;
    }
    Some(text.trim().to_string())
}

/// PON 模式规范化：`xgspon` → `XGS-PON`。
pub fn normalize_pon_mode(raw: &str) -> String {
    let mode = raw.trim().to_ascii_uppercase();
    if mode.contains("PON") && !mode.contains("-PON") {
        mode.replacen("PON", "-PON", 1)
    } else {
        mode
    }
}
