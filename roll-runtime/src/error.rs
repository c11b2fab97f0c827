//! # Error 模块
//!
//! 定义 roll-runtime 中使用的错误类型。
//!
//! 注意：动画核心本身没有致命错误。时长解析失败、空的可选集合、
//! 重复的 start 请求都会降级为默认行为，不会产生错误。
//! 这里的错误只出现在边界操作上（目录加载、管理操作、持久化）。

use thiserror::Error;

/// 目录（Catalog）错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// 目录为空
    #[error("目录为空，至少需要一个条目")]
    Empty,

    /// 条目名称为空
    #[error("第 {index} 个条目的名称为空")]
    EmptyName { index: usize },

    /// 条目名称重复
    #[error("条目名称重复: '{name}'")]
    DuplicateName { name: String },

    /// JSON 格式错误
    #[error("目录 JSON 解析失败: {message}")]
    InvalidJson { message: String },
}

/// 同步通道错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// 序列化失败
    #[error("选择状态序列化失败: {0}")]
    Serialization(String),

    /// 持久化写入失败
    #[error("选择状态写入失败: {0}")]
    Io(String),
}

/// 统计数据错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// 序列化失败
    #[error("统计数据序列化失败: {0}")]
    Serialization(String),

    /// 反序列化失败
    #[error("统计数据反序列化失败: {0}")]
    Deserialization(String),

    /// 版本不兼容
    #[error("统计数据版本不兼容: 数据版本 {found} vs 当前版本 {current}")]
    IncompatibleVersion { found: u32, current: u32 },
}

/// 抽取引擎错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RollError {
    /// 抽取进行中，不允许管理操作
    #[error("抽取进行中，操作被拒绝")]
    Spinning,

    /// 未知条目
    #[error("条目 '{name}' 不在目录中")]
    UnknownItem { name: String },

    /// 目录错误
    #[error("目录错误: {0}")]
    Catalog(#[from] CatalogError),
}

/// Result 类型别名
pub type RollResult<T> = Result<T, RollError>;
