//! SFP 诊断 EEPROM 页解码
//!
//! 设备通过 `cat .../eeprom5x | base64` 输出两页：
//!
//! - **EEPROM50**（A0h）：厂商名、料号、版本、序列号等静态信息
//! - **EEPROM51**（A2h）：温度、电压、偏置电流、收发光功率等实时诊断
//!
//! 所有数值均为固定偏移的大端整数，按 SFF-8472 约定的系数换算。

use base64::{Engine as _, engine::general_purpose};
use domain::format::round_to;
use domain::{DeviceIdentity, OpticalDiagnostics};

use crate::error::DecodeError;
use crate::types::{DecodedPage, FieldSpec, FieldValue, Transform};

/// EEPROM51 最小长度（覆盖到 RX 功率字节 104-105）
pub const DIAGNOSTICS_MIN_LEN: usize = 106;

/// EEPROM50 最小长度（覆盖到版本字节 56-59）
pub const IDENTITY_MIN_LEN: usize = 60;

/// 功率为 0 或负数时的 dBm 下限
pub const DBM_FLOOR: f64 = -100.0;

const DIAGNOSTICS_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("temperature", 96, 2, Transform::FixedPoint8_8 { places: 2 }),
    FieldSpec::new(
        "voltage",
        98,
        2,
        Transform::BeU16 {
            divisor: 10_000.0,
            places: 3,
        },
    ),
    FieldSpec::new(
        "tx_bias",
        100,
        2,
        Transform::BeU16 {
            divisor: 500.0,
            places: 2,
        },
    ),
    FieldSpec::new(
        "tx_power_mw",
        102,
        2,
        Transform::BeU16 {
            divisor: 10_000.0,
            places: 4,
        },
    ),
    FieldSpec::new(
        "rx_power_mw",
        104,
        2,
        Transform::BeU16 {
            divisor: 10_000.0,
            places: 4,
        },
    ),
];

const IDENTITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("vendor", 20, 16, Transform::Ascii),
    FieldSpec::new("part_number", 40, 16, Transform::Ascii),
    FieldSpec::new("revision", 56, 4, Transform::Ascii),
    // 需要 84 字节，较短的页只缺这一项
    FieldSpec::new("serial_number", 68, 16, Transform::Ascii),
];

/// 按字段表解码一页。
///
/// 缓冲区短于 `min_len` 时返回 [`DecodeError::TooShort`]；
/// 超过 `min_len` 但仍不足以覆盖的字段直接缺失（部分结果）。
pub fn decode_page(
    bytes: &[u8],
    page: &'static str,
    min_len: usize,
    fields: &[FieldSpec],
) -> Result<DecodedPage, DecodeError> {
    if bytes.len() < min_len {
        return Err(DecodeError::TooShort {
            page,
            len: bytes.len(),
            min: min_len,
        });
    }

    let mut decoded = DecodedPage::default();
    for field in fields {
        let Some(raw) = bytes.get(field.offset..field.offset + field.width) else {
            continue;
        };
        decoded.insert(field.name, apply(raw, field.transform));
    }
    Ok(decoded)
}

fn apply(raw: &[u8], transform: Transform) -> FieldValue {
    match transform {
        Transform::FixedPoint8_8 { places } => {
            let value = raw[0] as f64 + raw[1] as f64 / 256.0;
            FieldValue::Number(round_to(value, places))
        }
        Transform::BeU16 { divisor, places } => {
            let value = u16::from_be_bytes([raw[0], raw[1]]) as f64 / divisor;
            FieldValue::Number(round_to(value, places))
        }
        Transform::Ascii => {
            let text: String = raw
                .iter()
                .filter(|byte| byte.is_ascii())
                .map(|byte| *byte as char)
                .collect();
            FieldValue::Text(
                text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
                    .to_string(),
            )
        }
    }
}

/// 毫瓦转 dBm（2 位小数），功率 ≤ 0 时返回 [`DBM_FLOOR`]。
pub fn watts_to_dbm(mw: f64) -> f64 {
    if mw <= 0.0 {
        return DBM_FLOOR;
    }
    round_to(10.0 * mw.log10(), 2)
}

/// 解码 EEPROM51 实时诊断。
pub fn decode_diagnostics(bytes: &[u8]) -> Result<OpticalDiagnostics, DecodeError> {
    let page = decode_page(bytes, "eeprom51", DIAGNOSTICS_MIN_LEN, DIAGNOSTICS_FIELDS)?;
    let number = |name: &'static str| page.number(name).ok_or(DecodeError::MissingField(name));

    let tx_power_mw = number("tx_power_mw")?;
    let rx_power_mw = number("rx_power_mw")?;
    Ok(OpticalDiagnostics {
        temperature: number("temperature")?,
        voltage: number("voltage")?,
        tx_bias: number("tx_bias")?,
        tx_power_mw,
        tx_power_dbm: watts_to_dbm(tx_power_mw),
        rx_power_mw,
        rx_power_dbm: watts_to_dbm(rx_power_mw),
    })
}

/// 解码 EEPROM50 设备身份。
pub fn decode_identity(bytes: &[u8]) -> Result<DeviceIdentity, DecodeError> {
    let page = decode_page(bytes, "eeprom50", IDENTITY_MIN_LEN, IDENTITY_FIELDS)?;
    let text = |name: &'static str| page.text(name).unwrap_or_default().to_string();

    Ok(DeviceIdentity {
        vendor: text("vendor"),
        part_number: text("part_number"),
        revision: text("revision"),
        serial_number: page
            .text("serial_number")
            .filter(|serial| !serial.is_empty())
            .map(str::to_string),
    })
}

/// 解码设备端 `base64` 命令输出（忽略换行与空白）。
pub fn decode_base64_page(text: &str) -> Result<Vec<u8>, DecodeError> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(DecodeError::Empty);
    }
    general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| DecodeError::Base64(e.to_string()))
}
