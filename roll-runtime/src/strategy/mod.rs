//! # Strategy 模块
//!
//! 抽取动画的步进算法。
//!
//! ## 执行模型
//!
//! 每种策略都是一个显式状态机：
//!
//! ```text
//! step(state, ctx, rng) -> Step { effects, next }
//!
//! next = Continue(delay)  -> 引擎在 delay 之后再次调用 step
//! next = Commit(item)     -> 最终结果已展示，引擎在停顿之后完成本次抽取
//! ```
//!
//! 策略不持有定时器，也不读取时间；`ctx.now` 由引擎传入。
//! 延迟执行的副作用（隐藏/翻开卡片）以 [`StepEffect`] 的形式返回，
//! 由引擎放入调度队列。
//!
//! ## 模块结构
//!
//! - [`traversal`]：四种方向遍历（行优先/列优先，正向/反向）
//! - [`elimination`]：逐个隐藏 / 逐个翻开（无放回抽取）
//! - [`fallback`]：旧版有放回随机

pub mod elimination;
pub mod fallback;
pub mod traversal;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::catalog::Item;
use crate::timing::{self, TRAVERSAL_START_DELAY_MS};

/// 抽取动画类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollType {
    /// 从左到右（行优先，正向）
    LeftToRight,
    /// 从右到左（行优先，反向）
    RightToLeft,
    /// 从上到下（列优先，反向）
    UpToDown,
    /// 从下到上（列优先，正向）
    BottomToTop,
    /// 逐个隐藏，最后剩下的为结果
    HideReveal,
    /// 逐个翻开，最后翻开的为结果
    ReverseReveal,
    /// 旧版：每步有放回随机
    Fallback,
}

impl RollType {
    /// 所有类型
    pub const ALL: [RollType; 7] = [
        RollType::LeftToRight,
        RollType::RightToLeft,
        RollType::UpToDown,
        RollType::BottomToTop,
        RollType::HideReveal,
        RollType::ReverseReveal,
        RollType::Fallback,
    ];

    /// 序列化标识（kebab-case）
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftToRight => "left-to-right",
            Self::RightToLeft => "right-to-left",
            Self::UpToDown => "up-to-down",
            Self::BottomToTop => "bottom-to-top",
            Self::HideReveal => "hide-reveal",
            Self::ReverseReveal => "reverse-reveal",
            Self::Fallback => "fallback",
        }
    }

    /// 界面显示名称
    pub fn label(&self) -> &'static str {
        match self {
            Self::LeftToRight => "Слева направо",
            Self::RightToLeft => "Справа налево",
            Self::UpToDown => "Сверху вниз",
            Self::BottomToTop => "Снизу вверх",
            Self::HideReveal => "Скрыть и показать",
            Self::ReverseReveal => "Обратное раскрытие",
            Self::Fallback => "Классический",
        }
    }

    /// 是否会修改网格的可见/翻开状态
    pub fn uses_transient_sets(&self) -> bool {
        matches!(self, Self::HideReveal | Self::ReverseReveal)
    }
}

impl fmt::Display for RollType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知的动画类型名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRollType(pub String);

impl fmt::Display for UnknownRollType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知的抽取类型: '{}'", self.0)
    }
}

impl std::error::Error for UnknownRollType {}

impl FromStr for RollType {
    type Err = UnknownRollType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rt| rt.as_str() == s)
            .ok_or_else(|| UnknownRollType(s.to_string()))
    }
}

/// 单步调用的时间上下文
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    /// 当前时间
    pub now: Duration,
    /// 会话开始时间
    pub start: Duration,
    /// 总时长
    pub total: Duration,
}

impl StepContext {
    /// 当前进度 `[0, 1]`
    pub fn progress(&self) -> f64 {
        timing::progress(self.start, self.now, self.total)
    }

    /// 总时长（毫秒）
    pub fn total_ms(&self) -> f64 {
        timing::as_millis_f64(self.total)
    }
}

/// 单步产生的副作用
#[derive(Debug, Clone, PartialEq)]
pub enum StepEffect {
    /// 立即高亮并发布该条目
    Select(Item),
    /// 在 `after` 之后隐藏卡片
    Hide { name: String, after: Duration },
    /// 在 `after` 之后翻开卡片
    Reveal { name: String, after: Duration },
}

/// 下一步
#[derive(Debug, Clone, PartialEq)]
pub enum Next {
    /// 在指定延迟后继续
    Continue(Duration),
    /// 提交最终结果
    Commit(Item),
}

/// 单步结果
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// 本步的副作用（按顺序执行）
    pub effects: Vec<StepEffect>,
    /// 下一步
    pub next: Next,
}

impl Step {
    /// 展示一个条目后继续
    fn show_then(item: Item, delay: Duration) -> Self {
        Self {
            effects: vec![StepEffect::Select(item)],
            next: Next::Continue(delay),
        }
    }
}

/// 抽取策略
///
/// 每次抽取创建一个新实例，实例字段即该次会话的全部策略状态。
pub trait RollStrategy: fmt::Debug {
    /// 策略对应的类型
    fn roll_type(&self) -> RollType;

    /// 会话开始到第一步之间的延迟
    fn initial_delay(&self) -> Duration {
        timing::millis(TRAVERSAL_START_DELAY_MS)
    }

    /// 状态转移
    fn step(&mut self, ctx: &StepContext, rng: &mut StdRng) -> Step;
}

/// 策略工厂：根据本次的候选池创建策略实例
///
/// 候选池非空由调用方保证。
pub type StrategyFactory = fn(&[Item], &mut StdRng) -> Box<dyn RollStrategy>;

/// 策略注册表
///
/// `RollType -> 工厂` 的映射，随机抽取在已注册的键上均匀进行。
/// 增删一种动画只需要修改注册表。
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    factories: BTreeMap<RollType, StrategyFactory>,
}

impl StrategyRegistry {
    /// 空注册表（所有请求都解析为 `Fallback`）
    pub fn new() -> Self {
        Self::default()
    }

    /// 标准注册表：六种位置/揭示动画
    pub fn standard() -> Self {
        Self::new()
            .with(RollType::LeftToRight, traversal::left_to_right)
            .with(RollType::RightToLeft, traversal::right_to_left)
            .with(RollType::UpToDown, traversal::up_to_down)
            .with(RollType::BottomToTop, traversal::bottom_to_top)
            .with(RollType::HideReveal, elimination::hide_reveal)
            .with(RollType::ReverseReveal, elimination::reverse_reveal)
    }

    /// 标准注册表 + 旧版随机模式
    pub fn with_legacy() -> Self {
        Self::standard().with(RollType::Fallback, fallback::build)
    }

    /// 注册（或替换）一种策略
    pub fn with(mut self, roll_type: RollType, factory: StrategyFactory) -> Self {
        self.register(roll_type, factory);
        self
    }

    /// 注册（或替换）一种策略
    pub fn register(&mut self, roll_type: RollType, factory: StrategyFactory) {
        self.factories.insert(roll_type, factory);
    }

    /// 移除一种策略
    pub fn unregister(&mut self, roll_type: RollType) -> bool {
        self.factories.remove(&roll_type).is_some()
    }

    /// 是否已注册
    pub fn contains(&self, roll_type: RollType) -> bool {
        self.factories.contains_key(&roll_type)
    }

    /// 已注册的类型
    pub fn roll_types(&self) -> Vec<RollType> {
        self.factories.keys().copied().collect()
    }

    /// 均匀随机选择一种已注册类型；注册表为空时为 `Fallback`
    pub fn pick(&self, rng: &mut StdRng) -> RollType {
        if self.factories.is_empty() {
            return RollType::Fallback;
        }
        let index = rng.random_range(0..self.factories.len());
        self.factories
            .keys()
            .nth(index)
            .copied()
            .unwrap_or(RollType::Fallback)
    }

    /// 创建策略实例；未注册的类型回退到旧版随机模式
    pub fn build(
        &self,
        roll_type: RollType,
        pool: &[Item],
        rng: &mut StdRng,
    ) -> Box<dyn RollStrategy> {
        match self.factories.get(&roll_type) {
            Some(factory) => factory(pool, rng),
            None => fallback::build(pool, rng),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// 用虚拟时钟把策略跑到提交，返回（所有效果, 提交的条目, 结束时间）
    pub fn run_to_commit(
        strategy: &mut dyn RollStrategy,
        total: Duration,
        rng: &mut StdRng,
    ) -> (Vec<StepEffect>, Item, Duration) {
        let start = Duration::ZERO;
        let mut now = start + strategy.initial_delay();
        let mut effects = Vec::new();

        for _ in 0..100_000 {
            let ctx = StepContext { now, start, total };
            let step = strategy.step(&ctx, rng);
            effects.extend(step.effects);
            match step.next {
                Next::Continue(delay) => now += delay,
                Next::Commit(item) => return (effects, item, now),
            }
        }
        panic!("strategy never committed");
    }

    pub fn items(count: usize) -> Vec<Item> {
        (0..count)
            .map(|i| Item::new(format!("set-{i:02}"), vec![format!("{i}.png")]))
            .collect()
    }

    pub fn selected_names(effects: &[StepEffect]) -> Vec<String> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                StepEffect::Select(item) => Some(item.name.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    #[test]
    fn test_roll_type_string_roundtrip() {
        for rt in RollType::ALL {
            assert_eq!(rt.as_str().parse::<RollType>(), Ok(rt));
            let json = serde_json::to_string(&rt).unwrap();
            assert_eq!(json, format!("\"{}\"", rt.as_str()));
        }
        assert!("diagonal".parse::<RollType>().is_err());
    }

    #[test]
    fn test_standard_registry_contents() {
        let registry = StrategyRegistry::standard();
        assert_eq!(registry.roll_types().len(), 6);
        assert!(!registry.contains(RollType::Fallback));
        assert!(StrategyRegistry::with_legacy().contains(RollType::Fallback));
    }

    #[test]
    fn test_pick_covers_every_registered_type() {
        let registry = StrategyRegistry::standard();
        let mut rng = StdRng::seed_from_u64(1);
        let seen: BTreeSet<RollType> = (0..500).map(|_| registry.pick(&mut rng)).collect();
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), registry.roll_types());
    }

    #[test]
    fn test_empty_registry_resolves_to_fallback() {
        let mut registry = StrategyRegistry::standard();
        for rt in registry.roll_types() {
            assert!(registry.unregister(rt));
        }
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(registry.pick(&mut rng), RollType::Fallback);

        let pool = test_support::items(3);
        let strategy = registry.build(RollType::HideReveal, &pool, &mut rng);
        assert_eq!(strategy.roll_type(), RollType::Fallback);
    }

    #[test]
    fn test_build_matches_requested_type() {
        let registry = StrategyRegistry::with_legacy();
        let pool = test_support::items(4);
        let mut rng = StdRng::seed_from_u64(3);
        for rt in RollType::ALL {
            assert_eq!(registry.build(rt, &pool, &mut rng).roll_type(), rt);
        }
    }
}
