//! # Roll Host
//!
//! `roll-runtime` 的终端宿主。
//!
//! ## 职责
//!
//! - 配置文件加载（[`AppConfig`]）
//! - 统计、历史与叠加层文件的持久化
//! - 日志初始化
//! - 把时钟接到引擎上的主循环（[`Driver`]）

pub mod config;
pub mod driver;
pub mod history_file;
pub mod overlay;
pub mod stats_store;

pub use config::{AppConfig, ConfigError};
pub use driver::{Clock, Driver, SystemClock, VirtualClock, describe};
pub use history_file::{HistoryFile, format_record};
pub use overlay::{OverlayFile, OverlayStyle, overlay_link, overlay_query, parse_overlay_query};
pub use stats_store::StatsStore;

use roll_runtime::{RollEngine, StrategyRegistry, SyncChannel};

/// 引擎创建选项（来自命令行）
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// 固定随机种子
    pub seed: Option<u64>,
    /// 启用旧版随机模式
    pub legacy: bool,
}

/// 初始化日志
///
/// `verbose` 时强制 debug，否则使用配置中的级别（无效时为 info）。
pub fn init_tracing(config: &AppConfig, verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(tracing::Level::INFO)
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 当前 Unix 秒，作为引擎时间起点（历史记录时间戳）
fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// 按配置创建引擎：目录、文件统计、历史、叠加层同步
pub fn build_engine(config: &AppConfig, options: &EngineOptions) -> anyhow::Result<RollEngine> {
    let catalog = config.load_catalog()?;
    let stats = StatsStore::open(config.stats_path());
    let history = HistoryFile::new(config.history_path()).load();
    let channel = SyncChannel::new().with_store(OverlayFile::new(config.overlay_path()));

    let registry = if options.legacy {
        StrategyRegistry::with_legacy()
    } else {
        StrategyRegistry::standard()
    };

    let mut engine = RollEngine::new(catalog, stats)
        .with_config(config.roll)
        .with_registry(registry)
        .with_history(history)
        .with_channel(channel)
        .with_wall_epoch(unix_now());
    if let Some(seed) = options.seed {
        engine = engine.with_seed(seed);
    }
    Ok(engine)
}

/// 保存引擎的历史记录（失败只记录警告）
pub fn save_history(config: &AppConfig, engine: &RollEngine) {
    if let Err(e) = HistoryFile::new(config.history_path()).save(engine.history()) {
        tracing::warn!(error = %e, "历史文件写入失败");
    }
}
