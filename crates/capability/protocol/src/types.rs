//! 字节页字段表相关类型定义

use std::collections::BTreeMap;

/// 字段值变换方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// 8.8 定点数：整数字节 + 小数字节/256
    FixedPoint8_8 { places: i32 },
    /// 16 位大端无符号整数除以系数
    BeU16 { divisor: f64, places: i32 },
    /// ASCII 文本（非 ASCII 字节丢弃，去除首尾空白与 NUL 填充）
    Ascii,
}

/// 字段定义：`(名称, 偏移, 宽度, 变换)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub transform: Transform,
}

impl FieldSpec {
    pub const fn new(name: &'static str, offset: usize, width: usize, transform: Transform) -> Self {
        Self {
            name,
            offset,
            width,
            transform,
        }
    }
}

/// 解码后的字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

/// 一页解码结果：字段名 → 值（缓冲区不足以覆盖的字段缺失）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedPage {
    fields: BTreeMap<&'static str, FieldValue>,
}

impl DecodedPage {
    pub(crate) fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.fields.insert(name, value);
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.fields.get(name) {
            Some(FieldValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
