//! # StatsStore 模块
//!
//! 基于文件的统计数据，每次修改后写回 `stats.json`。
//!
//! 持久化是尽力而为的：文件缺失或损坏时按空统计处理，写入失败只记录警告。

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use roll_runtime::{RollStats, StatsSink};

/// 文件统计
#[derive(Debug, Clone)]
pub struct StatsStore {
    path: PathBuf,
    stats: RollStats,
}

impl StatsStore {
    /// 打开统计文件（不存在或损坏时为空统计）
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let stats = match fs::read_to_string(&path) {
            Ok(json) => RollStats::from_json_lossy(&json),
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = ?path, error = %e, "统计文件读取失败，按空数据处理");
                }
                RollStats::new()
            }
        };
        Self { path, stats }
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 内存中的统计
    pub fn stats(&self) -> &RollStats {
        &self.stats
    }

    /// 写回文件
    fn persist(&self) {
        let json = match self.stats.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "统计数据序列化失败");
                return;
            }
        };

        if let Some(parent) = self.path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            tracing::warn!(path = ?parent, error = %e, "无法创建数据目录");
            return;
        }

        if let Err(e) = fs::write(&self.path, json) {
            tracing::warn!(path = ?self.path, error = %e, "统计文件写入失败");
        }
    }
}

impl StatsSink for StatsStore {
    fn counts(&self) -> &BTreeMap<String, u64> {
        self.stats.counts()
    }

    fn increment(&mut self, name: &str) {
        self.stats.increment(name);
        self.persist();
    }

    fn disabled_names(&self) -> &BTreeSet<String> {
        self.stats.disabled_names()
    }

    fn toggle_disabled(&mut self, name: &str) -> bool {
        let disabled = self.stats.toggle_disabled(name);
        self.persist();
        disabled
    }

    fn reset(&mut self) {
        self.stats.reset();
        self.persist();
    }
}
