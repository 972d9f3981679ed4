//! PON 运行状态码（ITU-T G.984/G.9807 ONU 状态机）。

/// 已知状态码与名称。
const PON_STATES: &[(u32, &str)] = &[
    (0, "O0 - Power-up state"),
    (10, "O1 - Initial state"),
    (11, "O1.1 - Off-sync state"),
    (12, "O1.2 - Profile learning state"),
    (20, "O2 - Stand-by state"),
    (23, "O2.3 - Serial number state"),
    (30, "O3 - Serial number state"),
    (40, "O4 - Ranging state"),
    (50, "O5 - Operation state"),
    (51, "O5.1 - Associated state"),
    (52, "O5.2 - Pending state"),
    (60, "O6 - Intermittent LOS state"),
    (70, "O7 - Emergency stop state"),
    (71, "O7.1 - Emergency stop off-sync state"),
    (72, "O7.2 - Emergency stop in-sync state"),
    (81, "O8.1 - Downstream tuning off-sync state"),
    (82, "O8.2 - Downstream tuning profile learning state"),
    (90, "O9 - Upstream tuning state"),
];

/// O5.x 运行态集合，链路视为 up。
const OPERATIONAL: [u32; 3] = [50, 51, 52];

/// 状态码转可读名称，未知码返回 `Unknown state N`。
pub fn pon_state_name(code: u32) -> String {
    PON_STATES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("Unknown state {}", code))
}

/// 状态码是否属于运行态（O5 系列）。
pub fn is_operational(code: u32) -> bool {
    OPERATIONAL.contains(&code)
}
