//! # Config 模块
//!
//! 抽取时长的配置与解析。
//!
//! 用户输入的秒数是自由文本：解析失败不报错，回退到默认值；
//! 解析结果不低于配置的下限。

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 默认时长下限（秒）
pub const DEFAULT_MIN_DURATION_SECS: u64 = 10;
/// 默认时长（秒）
pub const DEFAULT_DURATION_SECS: u64 = 10;

/// 抽取时长配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollConfig {
    /// 时长下限（秒）
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: u64,

    /// 输入无效时的默认时长（秒）
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u64,
}

fn default_min_duration_secs() -> u64 {
    DEFAULT_MIN_DURATION_SECS
}

fn default_duration_secs() -> u64 {
    DEFAULT_DURATION_SECS
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: DEFAULT_MIN_DURATION_SECS,
            default_duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

impl RollConfig {
    /// 解析用户输入的秒数
    ///
    /// - 去掉首尾空白后为空：默认时长
    /// - 取开头的整数部分（可带符号），其余字符忽略：`"12s"` 为 12 秒
    /// - 开头没有数字：默认时长
    /// - 结果不低于下限：`"0"` 与 `"-5"` 都得到下限
    pub fn parse_duration(&self, input: &str) -> Duration {
        let secs = match leading_integer(input.trim()) {
            Some(value) => value,
            None => {
                tracing::debug!(input, "时长输入无效，使用默认值");
                self.default_duration_secs as i64
            }
        };
        self.duration_from_secs(secs)
    }

    /// 秒数转时长，应用下限
    pub fn duration_from_secs(&self, secs: i64) -> Duration {
        let floor = self.min_duration_secs as i64;
        Duration::from_secs(secs.max(floor).max(0) as u64)
    }

    /// 默认时长（已应用下限）
    pub fn default_duration(&self) -> Duration {
        self.duration_from_secs(self.default_duration_secs as i64)
    }
}

/// 提取开头的整数：可选的 `+`/`-`，随后至少一个十进制数字
fn leading_integer(s: &str) -> Option<i64> {
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits: Vec<i64> = rest
        .bytes()
        .take_while(u8::is_ascii_digit)
        .map(|b| i64::from(b - b'0'))
        .collect();
    if digits.is_empty() {
        return None;
    }

    let value = digits
        .into_iter()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(d));
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(v: u64) -> Duration {
        Duration::from_secs(v)
    }

    #[test]
    fn test_parse_duration_valid() {
        let config = RollConfig::default();
        assert_eq!(config.parse_duration("12"), secs(12));
        assert_eq!(config.parse_duration("  30  "), secs(30));
        assert_eq!(config.parse_duration("+25"), secs(25));
        assert_eq!(config.parse_duration("15s"), secs(15));
        assert_eq!(config.parse_duration("20.9"), secs(20));
    }

    #[test]
    fn test_parse_duration_floor() {
        let config = RollConfig::default();
        assert_eq!(config.parse_duration("0"), secs(10));
        assert_eq!(config.parse_duration("3"), secs(10));
        assert_eq!(config.parse_duration("-5"), secs(10));
    }

    #[test]
    fn test_parse_duration_defaults() {
        let config = RollConfig {
            min_duration_secs: 5,
            default_duration_secs: 8,
        };
        assert_eq!(config.parse_duration(""), secs(8));
        assert_eq!(config.parse_duration("   "), secs(8));
        assert_eq!(config.parse_duration("abc"), secs(8));
        assert_eq!(config.parse_duration("-"), secs(8));
        assert_eq!(config.parse_duration("s12"), secs(8));
    }

    #[test]
    fn test_configurable_floor() {
        let config = RollConfig {
            min_duration_secs: 15,
            ..RollConfig::default()
        };
        assert_eq!(config.parse_duration("12"), secs(15));
        assert_eq!(config.default_duration(), secs(15));
    }

    #[test]
    fn test_huge_input_saturates() {
        let config = RollConfig::default();
        let d = config.parse_duration("99999999999999999999999");
        assert_eq!(d, secs(i64::MAX as u64));
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: RollConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RollConfig::default());

        let config: RollConfig = serde_json::from_str(r#"{ "min_duration_secs": 15 }"#).unwrap();
        assert_eq!(config.min_duration_secs, 15);
        assert_eq!(config.default_duration_secs, 10);
    }
}
