//! # Input 模块
//!
//! 定义宿主向引擎传递的输入。
//!
//! ## 设计说明
//!
//! - `RollInput` 是宿主采集用户操作后传给引擎的语义化输入
//! - 时长以原始文本传入，由引擎按 [`RollConfig`](crate::config::RollConfig) 解析
//! - 时间流逝不是输入：宿主直接调用 `tick(now)`

use serde::{Deserialize, Serialize};

use crate::strategy::RollType;

/// 宿主向引擎传递的输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RollInput {
    /// 开始抽取（时长为用户输入的秒数文本）
    Start { duration: String },

    /// 以指定动画类型开始抽取
    StartWith { duration: String, roll_type: RollType },

    /// 切换条目的禁用状态
    ToggleDisabled { name: String },

    /// 清空统计
    ResetStats,
}

impl RollInput {
    /// 创建开始输入
    pub fn start(duration: impl Into<String>) -> Self {
        Self::Start {
            duration: duration.into(),
        }
    }

    /// 创建指定类型的开始输入
    pub fn start_with(duration: impl Into<String>, roll_type: RollType) -> Self {
        Self::StartWith {
            duration: duration.into(),
            roll_type,
        }
    }

    /// 创建禁用切换输入
    pub fn toggle(name: impl Into<String>) -> Self {
        Self::ToggleDisabled { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_creation() {
        assert_eq!(
            RollInput::start("12"),
            RollInput::Start {
                duration: "12".to_string()
            }
        );
        assert_eq!(
            RollInput::start_with("", RollType::HideReveal),
            RollInput::StartWith {
                duration: String::new(),
                roll_type: RollType::HideReveal
            }
        );
        assert_eq!(
            RollInput::toggle("Духи"),
            RollInput::ToggleDisabled {
                name: "Духи".to_string()
            }
        );
    }

    #[test]
    fn test_input_serialization() {
        let input = RollInput::start_with("15", RollType::BottomToTop);
        let json = serde_json::to_string(&input).unwrap();
        let restored: RollInput = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, input);
    }
}
