//! 数值舍入与展示格式化。

/// 保留 `places` 位小数。
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// 摄氏转华氏（1 位小数）。
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    round_to(celsius * 1.8 + 32.0, 1)
}

/// 状态持续时间：`Xh Ym Zs`，不足 1 小时为 `Ym Zs`。
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}

/// 运行时长：`Ad Bh Cm`，不足 1 天为 `Bh Cm`。
pub fn format_uptime(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let days = hours / 24;
    if days > 0 {
        format!("{}d {}h {}m", days, hours % 24, minutes)
    } else {
        format!("{}h {}m", hours, minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_places() {
        assert_eq!(round_to(0.6784, 3), 0.678);
        assert_eq!(round_to(38.50390625, 2), 38.5);
        assert_eq!(round_to(-14.9621, 2), -14.96);
    }

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(59), "0m 59s");
        assert_eq!(format_duration(3725), "1h 2m 5s");
        assert_eq!(format_duration(297_761), "82h 42m 41s");
    }

    #[test]
    fn uptime_formats() {
        assert_eq!(format_uptime(3_660), "1h 1m");
        assert_eq!(format_uptime(299_633), "3d 11h 13m");
    }

    #[test]
    fn fahrenheit() {
        assert_eq!(celsius_to_fahrenheit(38.5), 101.3);
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
    }
}
