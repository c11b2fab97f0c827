//! # Event 模块
//!
//! 引擎向宿主输出的事件。
//!
//! 引擎不渲染任何东西：`tick` 返回的事件序列描述了状态如何变化，
//! 宿主按顺序消费即可（终端输出、UI 刷新、日志……）。

use serde::{Deserialize, Serialize};

use crate::catalog::Item;
use crate::strategy::RollType;

/// 引擎事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RollEvent {
    /// 抽取开始
    Started {
        roll_type: RollType,
        duration_ms: u64,
        /// 本次候选池的大小
        pool: usize,
    },

    /// 高亮条目变化
    Selected { item: Item },

    /// 卡片被隐藏
    Hidden { name: String },

    /// 卡片被翻开
    Revealed { name: String },

    /// 最终结果已展示
    Committed { item: Item, roll_type: RollType },

    /// 抽取完成（计数已记录）
    Finished { item: Item, roll_type: RollType },

    /// 网格恢复到默认状态
    TransientReset { roll_type: RollType },

    /// 禁用状态变化
    DisabledChanged { name: String, disabled: bool },

    /// 统计已清空
    StatsReset,
}

impl RollEvent {
    /// 是否为本次抽取的结束事件
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// 事件携带的条目
    pub fn item(&self) -> Option<&Item> {
        match self {
            Self::Selected { item } | Self::Committed { item, .. } | Self::Finished { item, .. } => {
                Some(item)
            }
            _ => None,
        }
    }
}
