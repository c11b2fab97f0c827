//! # History 模块
//!
//! 已完成抽取的记录。
//!
//! ## 设计原则
//!
//! - 只记录完成的抽取（被拒绝的 start 不产生记录）
//! - 所有数据可序列化，宿主可以与统计数据一起保存
//! - 容量有上限，超出时丢弃最早的记录

use serde::{Deserialize, Serialize};

use crate::strategy::RollType;

/// 默认最多保留的记录数
pub const DEFAULT_MAX_RECORDS: usize = 100;

/// 单次抽取记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollRecord {
    /// 最终条目名称
    pub name: String,
    /// 动画类型
    pub roll_type: RollType,
    /// 请求的总时长（毫秒）
    pub duration_ms: u64,
    /// 时间戳（Unix 秒）
    pub timestamp: u64,
}

impl RollRecord {
    /// 创建记录（时间戳由调用方提供）
    pub fn new(
        name: impl Into<String>,
        roll_type: RollType,
        duration_ms: u64,
        timestamp: u64,
    ) -> Self {
        Self {
            name: name.into(),
            roll_type,
            duration_ms,
            timestamp,
        }
    }
}

/// 抽取历史
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollHistory {
    /// 记录（按时间顺序）
    records: Vec<RollRecord>,
    /// 最大记录数
    max_records: usize,
}

impl Default for RollHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl RollHistory {
    /// 创建空历史
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            max_records: DEFAULT_MAX_RECORDS,
        }
    }

    /// 设置最大记录数（至少 1）
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max.max(1);
        self
    }

    /// 添加记录
    pub fn push(&mut self, record: RollRecord) {
        self.records.push(record);

        // 反序列化得到的上限可能为 0
        let max = self.max_records.max(1);
        if self.records.len() > max {
            let overflow = self.records.len() - max;
            self.records.drain(..overflow);
        }
    }

    /// 所有记录
    pub fn records(&self) -> &[RollRecord] {
        &self.records
    }

    /// 最近的 N 条（按时间顺序）
    pub fn recent(&self, count: usize) -> &[RollRecord] {
        let skip = self.records.len().saturating_sub(count);
        &self.records[skip..]
    }

    /// 最近一条
    pub fn last(&self) -> Option<&RollRecord> {
        self.records.last()
    }

    /// 某条目出现的次数
    pub fn count_for(&self, name: &str) -> usize {
        self.records.iter().filter(|r| r.name == name).count()
    }

    /// 清空
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// 记录数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
