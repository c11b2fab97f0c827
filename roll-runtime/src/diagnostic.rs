//! # 诊断模块
//!
//! 提供目录静态检查 API，不依赖 IO 或引擎。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 与 [`Catalog::new`](crate::catalog::Catalog::new) 的校验规则保持一致，但会报告全部问题而不是第一个

use std::collections::{HashMap, HashSet};

use crate::catalog::{GRID_COLUMNS, Item};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 目录来源（文件路径或 "builtin"）
    pub source: String,
    /// 条目序号（从 0 开始，如果可定位）
    pub index: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情
    pub detail: Option<String>,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            source: source.into(),
            index: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, source, message)
    }

    /// 创建警告诊断
    pub fn warn(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, source, message)
    }

    /// 创建信息诊断
    pub fn info(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, source, message)
    }

    /// 设置条目序号
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.source)?;
        if let Some(index) = self.index {
            write!(f, "#{}", index)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

//=============================================================================
// 目录分析 API
//=============================================================================

/// 分析目录，返回诊断结果
///
/// 执行以下检查：
/// - 空目录、空名称、重复名称（Error）
/// - 没有资源的条目、条目内重复的资源（Warn）
/// - 少于 2 个条目（Warn：揭示类动画没有淘汰过程）
/// - 网格最后一行不满（Info）
pub fn analyze_catalog(source: &str, items: &[Item]) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    if items.is_empty() {
        result.push(Diagnostic::error(source, "目录为空"));
        return result;
    }

    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        let name = item.name.trim();
        if name.is_empty() {
            result.push(Diagnostic::error(source, "条目名称为空").with_index(index));
            continue;
        }

        if let Some(first) = first_seen.get(name) {
            result.push(
                Diagnostic::error(source, format!("条目名称重复: **{}**", name))
                    .with_index(index)
                    .with_detail(format!("第一次出现在 #{}", first)),
            );
        } else {
            first_seen.insert(name, index);
        }

        if item.assets.is_empty() {
            result.push(
                Diagnostic::warn(source, format!("条目 **{}** 没有任何资源", name))
                    .with_index(index),
            );
        }

        let mut seen_assets = HashSet::new();
        for asset in &item.assets {
            if !seen_assets.insert(asset.as_str()) {
                result.push(
                    Diagnostic::warn(source, format!("条目 **{}** 中资源重复", name))
                        .with_index(index)
                        .with_detail(asset.clone()),
                );
            }
        }
    }

    if items.len() < 2 {
        result.push(
            Diagnostic::warn(source, "目录少于 2 个条目")
                .with_detail("hide-reveal / reverse-reveal 不会产生淘汰过程"),
        );
    }

    let tail = items.len() % GRID_COLUMNS;
    if tail != 0 {
        result.push(Diagnostic::info(
            source,
            format!("网格最后一行只有 {} / {} 个条目", tail, GRID_COLUMNS),
        ));
    }

    result
}

/// 收集目录引用的全部资源（去重，保持首次出现顺序）
pub fn collect_asset_references(items: &[Item]) -> Vec<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .flat_map(|item| item.assets.iter())
        .map(String::as_str)
        .filter(|asset| seen.insert(*asset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn item(name: &str, assets: &[&str]) -> Item {
        Item::new(name, assets.iter().map(|a| a.to_string()).collect())
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("sets.json", "条目名称重复")
            .with_index(3)
            .with_detail("第一次出现在 #1");

        let display = format!("{}", diag);
        assert!(display.contains("[ERROR]"));
        assert!(display.contains("sets.json#3"));
        assert!(display.contains("条目名称重复"));
        assert!(display.contains("| 第一次出现在 #1"));
    }

    #[test]
    fn test_builtin_catalog_has_no_errors() {
        let result = analyze_catalog("builtin", Catalog::builtin().items());
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert_eq!(result.warn_count(), 0);
    }

    #[test]
    fn test_empty_catalog() {
        let result = analyze_catalog("empty.json", &[]);
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_reports_every_problem() {
        let items = vec![
            item("a", &["x.png"]),
            item(" ", &["y.png"]),
            item("a", &[]),
            item("b", &["z.png", "z.png"]),
        ];
        let result = analyze_catalog("sets.json", &items);

        assert_eq!(result.error_count(), 2);
        assert_eq!(result.warn_count(), 2);

        let duplicate = result
            .diagnostics
            .iter()
            .find(|d| d.message.contains("重复") && d.level == DiagnosticLevel::Error)
            .unwrap();
        assert_eq!(duplicate.index, Some(2));
    }

    #[test]
    fn test_small_catalog_warning() {
        let result = analyze_catalog("one.json", &[item("solo", &["s.png"])]);
        assert!(!result.has_errors());
        assert_eq!(result.warn_count(), 1);
        assert_eq!(result.filter_by_level(DiagnosticLevel::Info).len(), 2);
    }

    #[test]
    fn test_collect_asset_references() {
        let items = vec![item("a", &["x", "y"]), item("b", &["y", "z"])];
        assert_eq!(collect_asset_references(&items), vec!["x", "y", "z"]);
    }
}
