//! # Engine 模块
//!
//! 抽取编排器：会话生命周期、调度、统计与同步。
//!
//! ## 执行模型
//!
//! ```text
//! start(now, total) -> StartOutcome
//! tick(now)         -> Vec<RollEvent>
//! next_deadline()   -> Option<Duration>
//! ```
//!
//! 1. `start` 冻结一份打乱的目录，选择动画类型并调度第一步
//! 2. 宿主在 `next_deadline` 到达时调用 `tick`
//! 3. `tick` 按时间顺序执行所有到期任务（步进、延迟隐藏/翻开、完成、网格恢复）
//! 4. 每个任务在其计划时间执行，与 `tick` 被调用的实际时间无关
//!
//! 同一时刻最多一个会话：会话进行中的 `start` 是无操作。

use std::collections::BTreeSet;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::catalog::{self, Catalog, Item};
use crate::config::RollConfig;
use crate::error::{RollError, RollResult};
use crate::event::RollEvent;
use crate::history::{RollHistory, RollRecord};
use crate::input::RollInput;
use crate::scheduler::Scheduler;
use crate::stats::StatsSink;
use crate::strategy::{Next, RollStrategy, RollType, StepContext, StepEffect, StrategyRegistry};
use crate::sync::{SelectionUpdate, SyncChannel};
use crate::timing::{self, SETTLE_DELAY_MS, TRANSIENT_RESET_DELAY_MS};

/// 调度队列中的任务
#[derive(Debug, Clone, PartialEq)]
enum Task {
    /// 调用策略的下一步
    Step,
    /// 隐藏卡片
    Hide(String),
    /// 翻开卡片
    Reveal(String),
    /// 完成本次抽取
    Finish,
    /// 恢复网格的可见/翻开状态
    ResetTransient(RollType),
}

/// `start` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// 新会话已开始
    Started(RollType),
    /// 已有会话进行中，请求被忽略
    AlreadySpinning,
}

/// 进行中的会话
#[derive(Debug)]
struct RollSession {
    start: Duration,
    total: Duration,
    roll_type: RollType,
    strategy: Box<dyn RollStrategy>,
    committed: Option<Item>,
}

/// 抽取引擎
///
/// # 使用示例
///
/// ```ignore
/// let mut engine = RollEngine::new(Catalog::builtin(), RollStats::new());
/// engine.handle(RollInput::start("12"), now)?;
///
/// while let Some(deadline) = engine.next_deadline() {
///     // 宿主等待到 deadline...
///     for event in engine.tick(deadline) {
///         // 渲染 event...
///     }
/// }
/// ```
pub struct RollEngine {
    catalog: Catalog,
    config: RollConfig,
    registry: StrategyRegistry,
    stats: Box<dyn StatsSink>,
    channel: SyncChannel,
    history: RollHistory,
    /// 时间起点对应的 Unix 秒（用于历史记录的时间戳）
    wall_epoch: u64,
    rng: StdRng,
    scheduler: Scheduler<Task>,
    session: Option<RollSession>,
    /// 尚未交给宿主的事件（由 `tick` / `handle` 取走）
    pending: Vec<RollEvent>,
    grid_order: Vec<Item>,
    selected: Option<Item>,
    current_roll_type: Option<RollType>,
    visible: BTreeSet<String>,
    revealed: BTreeSet<String>,
}

impl RollEngine {
    /// 创建引擎（标准注册表、默认配置、系统随机源）
    pub fn new(catalog: Catalog, stats: impl StatsSink + 'static) -> Self {
        let grid_order = catalog.items().to_vec();
        let visible = catalog.names();
        Self {
            catalog,
            config: RollConfig::default(),
            registry: StrategyRegistry::standard(),
            stats: Box::new(stats),
            channel: SyncChannel::new(),
            history: RollHistory::new(),
            wall_epoch: 0,
            rng: StdRng::from_os_rng(),
            scheduler: Scheduler::new(),
            session: None,
            pending: Vec::new(),
            grid_order,
            selected: None,
            current_roll_type: None,
            visible,
            revealed: BTreeSet::new(),
        }
    }

    /// 设置时长配置
    pub fn with_config(mut self, config: RollConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置策略注册表
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// 使用固定种子（测试与 `--seed`）
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// 设置同步通道
    pub fn with_channel(mut self, channel: SyncChannel) -> Self {
        self.channel = channel;
        self
    }

    /// 设置历史记录（例如从宿主恢复）
    pub fn with_history(mut self, history: RollHistory) -> Self {
        self.history = history;
        self
    }

    /// 设置时间起点对应的 Unix 秒
    ///
    /// 引擎不读取系统时钟；历史记录的时间戳为 `wall_epoch + now`。
    pub fn with_wall_epoch(mut self, unix_secs: u64) -> Self {
        self.wall_epoch = unix_secs;
        self
    }

    //=========================================================================
    // 会话
    //=========================================================================

    /// 开始一次抽取，动画类型从注册表中均匀随机选择
    pub fn start(&mut self, now: Duration, total: Duration) -> StartOutcome {
        if self.session.is_some() {
            return StartOutcome::AlreadySpinning;
        }
        let roll_type = self.registry.pick(&mut self.rng);
        self.begin(now, total, roll_type)
    }

    /// 以指定动画类型开始一次抽取
    pub fn start_with(&mut self, now: Duration, total: Duration, roll_type: RollType) -> StartOutcome {
        if self.session.is_some() {
            return StartOutcome::AlreadySpinning;
        }
        self.begin(now, total, roll_type)
    }

    fn begin(&mut self, now: Duration, total: Duration, requested: RollType) -> StartOutcome {
        self.selected = None;
        // 上一次揭示动画的网格恢复提前完成
        self.scheduler
            .cancel_where(|task| matches!(task, Task::ResetTransient(_)));
        self.visible = self.catalog.names();
        self.revealed.clear();

        self.grid_order = catalog::shuffled(self.catalog.items(), &mut self.rng);
        let pool = catalog::enabled_or_all(&self.grid_order, self.stats.disabled_names());

        let strategy = self.registry.build(requested, &pool, &mut self.rng);
        let roll_type = strategy.roll_type();
        if roll_type == RollType::HideReveal {
            self.visible = pool.iter().map(|item| item.name.clone()).collect();
        }
        self.current_roll_type = Some(roll_type);

        self.scheduler.schedule(now + strategy.initial_delay(), Task::Step);
        self.session = Some(RollSession {
            start: now,
            total,
            roll_type,
            strategy,
            committed: None,
        });

        let duration_ms = timing::whole_millis(total);
        tracing::info!(
            roll_type = %roll_type,
            duration_ms,
            pool = pool.len(),
            "抽取开始"
        );
        self.pending.push(RollEvent::Started {
            roll_type,
            duration_ms,
            pool: pool.len(),
        });
        StartOutcome::Started(roll_type)
    }

    /// 执行所有到期任务，返回产生的事件
    pub fn tick(&mut self, now: Duration) -> Vec<RollEvent> {
        let mut events = std::mem::take(&mut self.pending);
        while let Some((at, task)) = self.scheduler.pop_due(now) {
            self.run_task(at, task, &mut events);
        }
        events
    }

    /// 最早的待执行任务时间
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    fn run_task(&mut self, at: Duration, task: Task, events: &mut Vec<RollEvent>) {
        match task {
            Task::Step => self.run_step(at, events),
            Task::Hide(name) => {
                if self.visible.remove(&name) {
                    events.push(RollEvent::Hidden { name });
                }
            }
            Task::Reveal(name) => {
                if self.revealed.insert(name.clone()) {
                    events.push(RollEvent::Revealed { name });
                }
            }
            Task::Finish => self.finish(at, events),
            Task::ResetTransient(roll_type) => {
                self.visible = self.catalog.names();
                self.revealed.clear();
                self.current_roll_type = None;
                tracing::debug!(roll_type = %roll_type, "网格已恢复");
                events.push(RollEvent::TransientReset { roll_type });
            }
        }
    }

    fn run_step(&mut self, at: Duration, events: &mut Vec<RollEvent>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let ctx = StepContext {
            now: at,
            start: session.start,
            total: session.total,
        };
        let step = session.strategy.step(&ctx, &mut self.rng);
        let roll_type = session.roll_type;

        for effect in step.effects {
            match effect {
                StepEffect::Select(item) => {
                    tracing::debug!(name = %item.name, progress = ctx.progress(), "step");
                    self.channel.publish(SelectionUpdate::from_item(&item, false));
                    self.selected = Some(item.clone());
                    events.push(RollEvent::Selected { item });
                }
                StepEffect::Hide { name, after } => {
                    self.scheduler.schedule(at + after, Task::Hide(name));
                }
                StepEffect::Reveal { name, after } => {
                    self.scheduler.schedule(at + after, Task::Reveal(name));
                }
            }
        }

        match step.next {
            Next::Continue(delay) => {
                self.scheduler.schedule(at + delay, Task::Step);
            }
            Next::Commit(item) => {
                self.channel.publish(SelectionUpdate::from_item(&item, true));
                self.selected = Some(item.clone());
                if let Some(session) = self.session.as_mut() {
                    session.committed = Some(item.clone());
                }
                self.scheduler
                    .schedule(at + timing::millis(SETTLE_DELAY_MS), Task::Finish);
                events.push(RollEvent::Committed { item, roll_type });
            }
        }
    }

    fn finish(&mut self, at: Duration, events: &mut Vec<RollEvent>) {
        let Some(session) = self.session.take() else {
            return;
        };
        let Some(item) = session.committed.or_else(|| self.selected.clone()) else {
            tracing::warn!(roll_type = %session.roll_type, "会话结束时没有选中条目");
            return;
        };

        self.stats.increment(&item.name);
        self.history.push(RollRecord::new(
            item.name.clone(),
            session.roll_type,
            timing::whole_millis(session.total),
            self.wall_epoch.saturating_add(at.as_secs()),
        ));

        if session.roll_type.uses_transient_sets() {
            self.scheduler.schedule(
                at + timing::millis(TRANSIENT_RESET_DELAY_MS),
                Task::ResetTransient(session.roll_type),
            );
        }

        tracing::info!(name = %item.name, roll_type = %session.roll_type, "抽取完成");
        events.push(RollEvent::Finished {
            item,
            roll_type: session.roll_type,
        });
    }

    //=========================================================================
    // 宿主输入与管理操作
    //=========================================================================

    /// 处理宿主输入，返回立即产生的事件
    ///
    /// 会话进行中的开始请求被忽略（返回空事件列表），
    /// 管理操作则返回 [`RollError::Spinning`]。
    pub fn handle(&mut self, input: RollInput, now: Duration) -> RollResult<Vec<RollEvent>> {
        match input {
            RollInput::Start { duration } => {
                let total = self.config.parse_duration(&duration);
                if self.start(now, total) == StartOutcome::AlreadySpinning {
                    tracing::debug!("抽取进行中，忽略开始请求");
                }
            }
            RollInput::StartWith {
                duration,
                roll_type,
            } => {
                let total = self.config.parse_duration(&duration);
                if self.start_with(now, total, roll_type) == StartOutcome::AlreadySpinning {
                    tracing::debug!("抽取进行中，忽略开始请求");
                }
            }
            RollInput::ToggleDisabled { name } => {
                self.toggle_disabled(&name)?;
            }
            RollInput::ResetStats => self.reset_stats()?,
        }
        Ok(std::mem::take(&mut self.pending))
    }

    /// 切换条目的禁用状态，返回切换后是否禁用
    pub fn toggle_disabled(&mut self, name: &str) -> RollResult<bool> {
        if self.is_spinning() {
            return Err(RollError::Spinning);
        }
        if !self.catalog.contains(name) {
            return Err(RollError::UnknownItem {
                name: name.to_string(),
            });
        }
        let disabled = self.stats.toggle_disabled(name);
        self.pending.push(RollEvent::DisabledChanged {
            name: name.to_string(),
            disabled,
        });
        Ok(disabled)
    }

    /// 清空计数与禁用集合
    pub fn reset_stats(&mut self) -> RollResult<()> {
        if self.is_spinning() {
            return Err(RollError::Spinning);
        }
        self.stats.reset();
        self.pending.push(RollEvent::StatsReset);
        Ok(())
    }

    //=========================================================================
    // 可观察状态
    //=========================================================================

    /// 当前高亮的条目
    pub fn selected(&self) -> Option<&Item> {
        self.selected.as_ref()
    }

    /// 当前（或最近一次）的动画类型；揭示类动画恢复网格后清空
    pub fn current_roll_type(&self) -> Option<RollType> {
        self.current_roll_type
    }

    /// 可见的卡片
    pub fn visible(&self) -> &BTreeSet<String> {
        &self.visible
    }

    /// 已翻开的卡片
    pub fn revealed(&self) -> &BTreeSet<String> {
        &self.revealed
    }

    /// 当前网格顺序（每次开始时重新打乱）
    pub fn grid_order(&self) -> &[Item] {
        &self.grid_order
    }

    /// 是否有会话进行中
    pub fn is_spinning(&self) -> bool {
        self.session.is_some()
    }

    /// 当前会话的进度
    pub fn progress(&self, now: Duration) -> Option<f64> {
        self.session
            .as_ref()
            .map(|s| timing::progress(s.start, now, s.total))
    }

    /// 目录
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// 时长配置
    pub fn config(&self) -> &RollConfig {
        &self.config
    }

    /// 统计数据
    pub fn stats(&self) -> &dyn StatsSink {
        self.stats.as_ref()
    }

    /// 抽取历史
    pub fn history(&self) -> &RollHistory {
        &self.history
    }

    /// 同步通道
    pub fn channel(&self) -> &SyncChannel {
        &self.channel
    }

    /// 同步通道（用于订阅）
    pub fn channel_mut(&mut self) -> &mut SyncChannel {
        &mut self.channel
    }
}
