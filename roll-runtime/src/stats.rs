//! # Stats 模块
//!
//! 抽取结果统计与禁用集合。
//!
//! ## 设计原则
//!
//! - 引擎只通过 [`StatsSink`] 接口访问统计数据
//! - 持久化是尽力而为的：损坏或缺失的数据视为空，不会导致失败
//! - 快照带版本号，与存档格式的兼容规则一致

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// 统计快照格式版本
pub const STATS_VERSION: u32 = 1;

/// 统计数据接口
///
/// 由宿主提供实现（内存、文件、浏览器存储……），引擎在抽取开始时读取禁用集合，
/// 在抽取完成时累加计数。
pub trait StatsSink {
    /// 各条目被抽中的次数
    fn counts(&self) -> &BTreeMap<String, u64>;

    /// 计数 +1
    fn increment(&mut self, name: &str);

    /// 禁用集合
    fn disabled_names(&self) -> &BTreeSet<String>;

    /// 切换禁用状态，返回切换后是否处于禁用
    fn toggle_disabled(&mut self, name: &str) -> bool;

    /// 清空计数与禁用集合
    fn reset(&mut self);

    /// 抽取总次数
    fn total(&self) -> u64 {
        self.counts().values().sum()
    }

    /// 单个条目的次数
    fn count(&self, name: &str) -> u64 {
        self.counts().get(name).copied().unwrap_or(0)
    }

    /// 单个条目占全部抽取的百分比（没有任何抽取时为 0）
    fn share(&self, name: &str) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.count(name) as f64 / total as f64 * 100.0
    }

    /// 是否禁用
    fn is_disabled(&self, name: &str) -> bool {
        self.disabled_names().contains(name)
    }
}

/// 统计快照（持久化格式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// 格式版本
    pub version: u32,
    /// 计数
    #[serde(default)]
    pub counts: BTreeMap<String, u64>,
    /// 禁用条目
    #[serde(default)]
    pub disabled: BTreeSet<String>,
}

/// 内存统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollStats {
    counts: BTreeMap<String, u64>,
    disabled: BTreeSet<String>,
}

impl RollStats {
    /// 创建空统计
    pub fn new() -> Self {
        Self::default()
    }

    /// 导出快照
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            version: STATS_VERSION,
            counts: self.counts.clone(),
            disabled: self.disabled.clone(),
        }
    }

    /// 从快照恢复
    pub fn from_snapshot(snapshot: StatsSnapshot) -> Result<Self, StatsError> {
        if snapshot.version != STATS_VERSION {
            return Err(StatsError::IncompatibleVersion {
                found: snapshot.version,
                current: STATS_VERSION,
            });
        }
        Ok(Self {
            counts: snapshot.counts,
            disabled: snapshot.disabled,
        })
    }

    /// 序列化为 JSON
    pub fn to_json(&self) -> Result<String, StatsError> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| StatsError::Serialization(e.to_string()))
    }

    /// 从 JSON 反序列化
    pub fn from_json(json: &str) -> Result<Self, StatsError> {
        let snapshot: StatsSnapshot =
            serde_json::from_str(json).map_err(|e| StatsError::Deserialization(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    /// 从 JSON 反序列化；任何错误都降级为空统计
    pub fn from_json_lossy(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "统计数据不可用，按空数据处理");
                Self::default()
            }
        }
    }
}

impl StatsSink for RollStats {
    fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    fn increment(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }

    fn disabled_names(&self) -> &BTreeSet<String> {
        &self.disabled
    }

    fn toggle_disabled(&mut self, name: &str) -> bool {
        if self.disabled.remove(name) {
            false
        } else {
            self.disabled.insert(name.to_string());
            true
        }
    }

    fn reset(&mut self) {
        self.counts.clear();
        self.disabled.clear();
    }
}
