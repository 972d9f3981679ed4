//! 根据 GPON 序列号前缀推断运营商。

// 参考 pon.wiki 与 hack-gpon.org/vendor
const ISP_PREFIXES: &[(&str, &str)] = &[
    ("HUMA", "AT&T"),
    ("NOKA", "AT&T"),
    ("COMM", "AT&T"),
    ("FTRO", "Frontier"),
    ("ALCL", "Bell Canada"),
    ("SMBS", "Bell Canada"),
    ("HWTC", "Huawei ISP"),
    ("ZTEG", "ZTE ISP"),
    ("UBNT", "Ubiquiti"),
];

/// 取序列号前 4 个字符（忽略大小写）查表，未命中返回 `Unknown`。
pub fn detect_isp(gpon_serial: &str) -> &'static str {
    let Some(prefix) = gpon_serial.get(..4) else {
        return "Unknown";
    };
    let prefix = prefix.to_ascii_uppercase();
    ISP_PREFIXES
        .iter()
        .find(|(known, _)| *known == prefix)
        .map(|(_, isp)| *isp)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::detect_isp;

    #[test]
    fn prefix_lookup_is_case_insensitive() {
        assert_eq!(detect_isp("HUMA12345678"), "AT&T");
        assert_eq!(detect_isp("ftro0000abcd"), "Frontier");
        assert_eq!(detect_isp("ALCLf00dbeef"), "Bell Canada");
    }

    #[test]
    fn short_or_unmapped_serial_is_unknown() {
        assert_eq!(detect_isp("HUM"), "Unknown");
        assert_eq!(detect_isp(""), "Unknown");
        assert_eq!(detect_isp("ABCD1234"), "Unknown");
    }
}
