//! 组合命令输出的分段解析
//!
//! 一次 SSH 调用的 stdout 中以哨兵行 `---NAME---` 分隔各子命令输出，
//! `---END---` 结束最后一段。第一个哨兵之前的文本丢弃。

use std::collections::BTreeMap;

/// 终止哨兵名称
pub const TERMINAL_SECTION: &str = "END";

const SENTINEL_MARK: &str = "---";

/// 段名 → 原始文本
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections {
    inner: BTreeMap<String, String>,
    terminated: bool,
}

impl Sections {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// 是否出现过 `---END---`
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// 格式化哨兵行。
pub fn sentinel(name: &str) -> String {
    format!("{SENTINEL_MARK}{name}{SENTINEL_MARK}")
}

/// 若该行是哨兵则返回段名。
pub fn sentinel_name(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.len() <= SENTINEL_MARK.len() * 2 {
        return None;
    }
    let name = line
        .strip_prefix(SENTINEL_MARK)?
        .strip_suffix(SENTINEL_MARK)?
        .trim_matches(|c: char| c == '-' || c.is_whitespace());
    if name.is_empty() { None } else { Some(name) }
}

enum SplitState<'a> {
    Idle,
    Open { name: &'a str, lines: Vec<&'a str> },
}

/// 按哨兵行切分输出；空段不保留。
pub fn split_sections(output: &str) -> Sections {
    let mut sections = Sections::default();
    let mut state = SplitState::Idle;

    for line in output.lines() {
        let Some(name) = sentinel_name(line) else {
            if let SplitState::Open { lines, .. } = &mut state {
                lines.push(line.trim_end_matches('\r'));
            }
            continue;
        };

        close(&mut sections, std::mem::replace(&mut state, SplitState::Idle));
        if name == TERMINAL_SECTION {
            sections.terminated = true;
        } else {
            state = SplitState::Open {
                name,
                lines: Vec::new(),
            };
        }
    }
    close(&mut sections, state);

    sections
}

fn close(sections: &mut Sections, state: SplitState<'_>) {
    if let SplitState::Open { name, lines } = state {
        let content = lines.join("\n");
        if !content.trim().is_empty() {
            sections.inner.insert(name.to_string(), content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_sections_and_preamble_discarded() {
        let output = "banner text\n---A---\nalpha\n---B---\nbeta 1\nbeta 2\n---END---\ntrailer\n";
        let sections = split_sections(output);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections.get("A"), Some("alpha"));
        assert_eq!(sections.get("B"), Some("beta 1\nbeta 2"));
        assert!(!sections.contains("END"));
        assert!(sections.is_terminated());
    }

    #[test]
    fn test_unterminated_last_section_closes_at_eof() {
        let sections = split_sections("---A---\nalpha\n---B---\nbeta");
        assert_eq!(sections.get("B"), Some("beta"));
        assert!(!sections.is_terminated());
    }

    #[test]
    fn test_empty_section_dropped() {
        let sections = split_sections("---A---\n---B---\nbeta\r\n---END---");
        assert!(!sections.contains("A"));
        assert_eq!(sections.get("B"), Some("beta"));
    }

    #[test]
    fn test_sentinel_detection() {
        assert_eq!(sentinel_name("---EEPROM51---"), Some("EEPROM51"));
        assert_eq!(sentinel_name("  ---PON_STATUS---\r"), Some("PON_STATUS"));
        assert_eq!(sentinel_name("------"), None);
        assert_eq!(sentinel_name("--- ---"), None);
        assert_eq!(sentinel_name("errorcode=0 current=51"), None);
        assert_eq!(sentinel(TERMINAL_SECTION), "---END---");
    }
}
