//! # Roll Runtime
//!
//! 英雄组合随机抽取动画的核心运行时库。
//!
//! ## 架构概述
//!
//! `roll-runtime` 是纯逻辑核心，不读取真实时钟，也不做任何 IO。
//! 它通过 **事件驱动模式** 与宿主层（Host）通信：
//!
//! ```text
//! Host                          Runtime
//!   │                              │
//!   │──── RollInput ─────────────►│ handle()
//!   │──── now ───────────────────►│ tick()
//!   │◄─── Vec<RollEvent> ─────────│
//!   │◄─── next_deadline() ────────│
//!   │                              │
//! ```
//!
//! 时间是宿主定义的起点之后的 `Duration`，测试可以用虚拟时钟确定性地推进。
//!
//! ## 核心类型
//!
//! - [`RollEngine`]：抽取编排器
//! - [`RollInput`]：宿主向引擎传递的输入
//! - [`RollEvent`]：引擎输出的事件
//! - [`RollType`] / [`StrategyRegistry`]：动画类型与策略注册表
//! - [`StatsSink`]：统计数据接口
//! - [`SyncChannel`]：跨视图同步
//!
//! ## 使用示例
//!
//! ```ignore
//! use roll_runtime::{Catalog, RollEngine, RollInput, RollStats};
//!
//! let mut engine = RollEngine::new(Catalog::builtin(), RollStats::new());
//! engine.handle(RollInput::start("12"), clock.now())?;
//!
//! while let Some(deadline) = engine.next_deadline() {
//!     clock.sleep_until(deadline);
//!     for event in engine.tick(deadline) {
//!         host.render(event);
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`catalog`]：条目与目录
//! - [`timing`]：进度与缓动延迟
//! - [`scheduler`]：可取消的延时任务队列
//! - [`strategy`]：动画策略（状态机）
//! - [`engine`]：编排器
//! - [`stats`]：统计数据
//! - [`sync`]：跨视图同步
//! - [`history`]：抽取历史
//! - [`config`]：时长配置
//! - [`diagnostic`]：目录静态检查
//! - [`error`]：错误类型定义

pub mod catalog;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod event;
pub mod history;
pub mod input;
pub mod scheduler;
pub mod stats;
pub mod strategy;
pub mod sync;
pub mod timing;

// 重导出核心类型
pub use catalog::{Catalog, GRID_COLUMNS, Item};
pub use config::RollConfig;
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_catalog, collect_asset_references,
};
pub use engine::{RollEngine, StartOutcome};
pub use error::{CatalogError, RollError, RollResult, StatsError, SyncError};
pub use event::RollEvent;
pub use history::{RollHistory, RollRecord};
pub use input::RollInput;
pub use scheduler::{Scheduler, TaskId};
pub use stats::{RollStats, STATS_VERSION, StatsSink, StatsSnapshot};
pub use strategy::{RollStrategy, RollType, StrategyRegistry, UnknownRollType};
pub use sync::{LastValueStore, MemoryLastValue, SelectionUpdate, SubscriptionId, SyncChannel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常使用
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 15);

        let _input = RollInput::start("10");

        let _update = SelectionUpdate::from_item(&catalog.items()[0], false);

        let engine = RollEngine::new(catalog, RollStats::new()).with_config(RollConfig::default());
        assert!(!engine.is_spinning());
        assert_eq!(engine.visible().len(), 15);
        assert_eq!(engine.current_roll_type(), None);
    }
}
