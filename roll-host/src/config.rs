//! # Config 模块
//!
//! 宿主配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use roll_runtime::{Catalog, RollConfig, analyze_catalog};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 数据目录（统计、历史、叠加层文件都放在这里）
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// 自定义目录 JSON 路径（未配置时使用内置目录）
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// 时长配置
    #[serde(default)]
    pub roll: RollConfig,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 统计文件名（相对于 data_dir）
    #[serde(default = "default_stats_file")]
    pub stats_file: String,

    /// 历史文件名（相对于 data_dir）
    #[serde(default = "default_history_file")]
    pub history_file: String,

    /// 叠加层同步文件名（相对于 data_dir）
    #[serde(default = "default_overlay_file")]
    pub overlay_file: String,

    /// 叠加层页面地址
    #[serde(default = "default_overlay_base_url")]
    pub overlay_base_url: String,
}

// 默认值函数

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stats_file() -> String {
    "stats.json".to_string()
}

fn default_history_file() -> String {
    "history.json".to_string()
}

fn default_overlay_file() -> String {
    "current_selection.json".to_string()
}

fn default_overlay_base_url() -> String {
    "http://localhost:5173/obs".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog_path: None,
            roll: RollConfig::default(),
            log_level: default_log_level(),
            stats_file: default_stats_file(),
            history_file: default_history_file(),
            overlay_file: default_overlay_file(),
            overlay_base_url: default_overlay_base_url(),
        }
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并打印警告。
    /// 此时日志系统尚未初始化，所以直接写 stderr。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            eprintln!("⚠️ 配置文件不存在: {:?}，使用默认配置", path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("⚠️ 配置文件解析失败: {}，使用默认配置", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("⚠️ 配置文件读取失败: {}，使用默认配置", e);
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;
        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roll.min_duration_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "roll.min_duration_secs 必须大于 0".to_string(),
            ));
        }

        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "无效的日志级别: '{}'",
                self.log_level
            )));
        }

        for (field, value) in [
            ("stats_file", &self.stats_file),
            ("history_file", &self.history_file),
            ("overlay_file", &self.overlay_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(format!("{} 不能为空", field)));
            }
        }

        if let Some(catalog) = &self.catalog_path
            && !catalog.exists()
        {
            return Err(ConfigError::ValidationFailed(format!(
                "目录文件不存在: {:?}",
                catalog
            )));
        }

        Ok(())
    }

    /// 统计文件完整路径
    pub fn stats_path(&self) -> PathBuf {
        self.data_dir.join(&self.stats_file)
    }

    /// 历史文件完整路径
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    /// 叠加层同步文件完整路径
    pub fn overlay_path(&self) -> PathBuf {
        self.data_dir.join(&self.overlay_file)
    }

    /// 加载目录
    ///
    /// 未配置 `catalog_path` 时使用内置目录。自定义目录的诊断警告会写入日志。
    pub fn load_catalog(&self) -> Result<Catalog, ConfigError> {
        let Some(path) = &self.catalog_path else {
            return Ok(Catalog::builtin());
        };

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("无法读取目录文件 {:?}: {}", path, e)))?;
        let catalog = Catalog::from_json(&content)
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;

        let report = analyze_catalog(&path.to_string_lossy(), catalog.items());
        for diagnostic in &report.diagnostics {
            tracing::warn!("{}", diagnostic);
        }
        Ok(catalog)
    }
}

/// 配置错误
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.roll.min_duration_secs, 10);
        assert_eq!(config.stats_path(), PathBuf::from("data/stats.json"));
        assert_eq!(
            config.overlay_path(),
            PathBuf::from("data/current_selection.json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "data_dir": "/tmp/roll", "roll": { "min_duration_secs": 15 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/roll"));
        assert_eq!(config.roll.min_duration_secs, 15);
        assert_eq!(config.roll.default_duration_secs, 10);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        config.log_level = "debug".to_string();
        config.roll.min_duration_secs = 0;
        assert!(config.validate().is_err());

        config.roll.min_duration_secs = 10;
        config.overlay_file = " ".to_string();
        assert!(config.validate().is_err());

        config.overlay_file = default_overlay_file();
        config.catalog_path = Some(PathBuf::from("/definitely/not/here.json"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builtin_catalog_when_unset() {
        let catalog = AppConfig::default().load_catalog().unwrap();
        assert_eq!(catalog.len(), 15);
    }
}
