//! 解码错误类型定义

/// 单个段/字段的解码错误（只影响该段，不影响本周期其余数据）
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// 页长度不足
    #[error("{page} too short: {len} bytes, need {min}")]
    TooShort {
        page: &'static str,
        len: usize,
        min: usize,
    },

    /// Base64 解码错误
    #[error("base64 decode error: {0}")]
    Base64(String),

    /// 整数字段无法解析
    #[error("invalid integer for {key}: {value}")]
    InvalidInteger { key: String, value: String },

    /// 必需字段缺失
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// 整体输出不可信（无终止哨兵或无任何预期段）
    #[error("malformed reply: {0}")]
    MalformedReply(String),

    /// 段内容为空或为占位值
    #[error("empty section")]
    Empty,
}
