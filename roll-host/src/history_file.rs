//! # HistoryFile 模块
//!
//! 抽取历史的文件读写，以及终端展示用的时间格式化。

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use roll_runtime::{RollHistory, RollRecord};

/// 历史文件
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 读取历史（不存在或损坏时为空）
    pub fn load(&self) -> RollHistory {
        let Ok(json) = fs::read_to_string(&self.path) else {
            return RollHistory::new();
        };
        match serde_json::from_str(&json) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "历史文件损坏，按空数据处理");
                RollHistory::new()
            }
        }
    }

    /// 写入历史
    pub fn save(&self, history: &RollHistory) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(history)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// 格式化一条记录：`2026-01-02 15:04  Духи  (hide-reveal, 10s)`
pub fn format_record(record: &RollRecord) -> String {
    let when = DateTime::from_timestamp(record.timestamp as i64, 0)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}  {}  ({}, {}s)",
        when,
        record.name,
        record.roll_type,
        record.duration_ms / 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use roll_runtime::RollType;

    #[test]
    fn test_roundtrip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let file = HistoryFile::new(dir.path().join("history.json"));
        assert!(file.load().is_empty());

        let mut history = RollHistory::new();
        history.push(RollRecord::new("Духи", RollType::UpToDown, 10_000, 1_700_000_000));
        file.save(&history).unwrap();

        assert_eq!(file.load(), history);
    }

    #[test]
    fn test_corrupt_history_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(HistoryFile::new(&path).load().is_empty());
    }

    #[test]
    fn test_format_record() {
        let record = RollRecord {
            name: "Крысы".to_string(),
            roll_type: RollType::HideReveal,
            duration_ms: 15_000,
            timestamp: 1_700_000_000,
        };
        let line = format_record(&record);
        assert!(line.contains("Крысы"));
        assert!(line.ends_with("(hide-reveal, 15s)"));
        assert!(line.starts_with("2023-11-1"));
    }
}
