//! # Traversal 模块
//!
//! 方向遍历：沿固定的网格顺序逐格移动高亮，速度逐渐放缓，
//! 进度走满时停在最后一次高亮的条目上。

use rand::Rng;
use rand::rngs::StdRng;

use super::{Next, RollStrategy, RollType, Step, StepContext, StepEffect};
use crate::catalog::{GRID_COLUMNS, Item, column_major_order, row_major_order};
use crate::timing::{self, DEFAULT_MIN_DELAY_MS};

/// 游标移动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 游标 +1，越过末尾回到开头
    Forward,
    /// 游标 -1，越过开头回到末尾
    Backward,
}

/// 方向遍历策略状态
#[derive(Debug)]
pub struct Traversal {
    roll_type: RollType,
    order: Vec<Item>,
    cursor: usize,
    direction: Direction,
}

impl Traversal {
    /// 创建遍历，游标从随机位置开始
    pub fn new(
        roll_type: RollType,
        order: Vec<Item>,
        direction: Direction,
        rng: &mut StdRng,
    ) -> Self {
        let cursor = if order.is_empty() {
            0
        } else {
            rng.random_range(0..order.len())
        };
        Self {
            roll_type,
            order,
            cursor,
            direction,
        }
    }

    /// 当前游标
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn advance(&mut self) {
        let len = self.order.len();
        self.cursor = match self.direction {
            Direction::Forward => (self.cursor + 1) % len,
            Direction::Backward => (self.cursor + len - 1) % len,
        };
    }
}

impl RollStrategy for Traversal {
    fn roll_type(&self) -> RollType {
        self.roll_type
    }

    fn step(&mut self, ctx: &StepContext, rng: &mut StdRng) -> Step {
        let progress = ctx.progress();
        let max_delay = timing::max_delay_for(ctx.total_ms());
        let jitter = timing::jitter_factor(rng);
        let delay = timing::eased_delay(DEFAULT_MIN_DELAY_MS, max_delay, progress, jitter);

        let item = self.order[self.cursor].clone();
        self.advance();

        if progress < 1.0 {
            Step::show_then(item, timing::millis(delay))
        } else {
            Step {
                effects: vec![StepEffect::Select(item.clone())],
                next: Next::Commit(item),
            }
        }
    }
}

/// 行优先，正向
pub fn left_to_right(pool: &[Item], rng: &mut StdRng) -> Box<dyn RollStrategy> {
    let order = row_major_order(pool, GRID_COLUMNS);
    Box::new(Traversal::new(
        RollType::LeftToRight,
        order,
        Direction::Forward,
        rng,
    ))
}

/// 行优先，反向
pub fn right_to_left(pool: &[Item], rng: &mut StdRng) -> Box<dyn RollStrategy> {
    let order = row_major_order(pool, GRID_COLUMNS);
    Box::new(Traversal::new(
        RollType::RightToLeft,
        order,
        Direction::Backward,
        rng,
    ))
}

/// 列优先，反向
pub fn up_to_down(pool: &[Item], rng: &mut StdRng) -> Box<dyn RollStrategy> {
    let order = column_major_order(pool, GRID_COLUMNS);
    Box::new(Traversal::new(
        RollType::UpToDown,
        order,
        Direction::Backward,
        rng,
    ))
}

/// 列优先，正向
pub fn bottom_to_top(pool: &[Item], rng: &mut StdRng) -> Box<dyn RollStrategy> {
    let order = column_major_order(pool, GRID_COLUMNS);
    Box::new(Traversal::new(
        RollType::BottomToTop,
        order,
        Direction::Forward,
        rng,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{items, run_to_commit, selected_names};
    use rand::SeedableRng;
    use std::collections::BTreeSet;
    use std::time::Duration;

    #[test]
    fn test_forward_wraps() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut traversal = Traversal::new(
            RollType::LeftToRight,
            items(3),
            Direction::Forward,
            &mut rng,
        );
        let first = traversal.cursor();
        for i in 1..=6 {
            traversal.advance();
            assert_eq!(traversal.cursor(), (first + i) % 3);
        }
    }

    #[test]
    fn test_backward_wraps() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut traversal = Traversal::new(
            RollType::RightToLeft,
            items(4),
            Direction::Backward,
            &mut rng,
        );
        let first = traversal.cursor();
        for i in 1..=8 {
            traversal.advance();
            assert_eq!(traversal.cursor(), (first + 4 * 8 - i) % 4);
        }
    }

    #[test]
    fn test_consecutive_selections_follow_order() {
        let pool = items(7);
        let order = column_major_order(&pool, GRID_COLUMNS);
        let mut rng = StdRng::seed_from_u64(11);
        let mut strategy = bottom_to_top(&pool, &mut rng);
        let (effects, _, _) = run_to_commit(strategy.as_mut(), Duration::from_secs(10), &mut rng);

        let names = selected_names(&effects);
        let position = |name: &str| order.iter().position(|item| item.name == name).unwrap();
        for pair in names.windows(2) {
            assert_eq!((position(&pair[0]) + 1) % order.len(), position(&pair[1]));
        }
    }

    #[test]
    fn test_commits_last_shown_item() {
        let pool = items(14);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut strategy = left_to_right(&pool, &mut rng);
            let (effects, committed, _) =
                run_to_commit(strategy.as_mut(), Duration::from_secs(10), &mut rng);
            let names = selected_names(&effects);
            assert_eq!(names.last(), Some(&committed.name));
        }
    }

    #[test]
    fn test_full_pass_visits_every_item() {
        for count in 1..=15 {
            let pool = items(count);
            for factory in [left_to_right, right_to_left, up_to_down, bottom_to_top] {
                let mut rng = StdRng::seed_from_u64(count as u64);
                let mut strategy = factory(&pool, &mut rng);
                let (effects, _, _) =
                    run_to_commit(strategy.as_mut(), Duration::from_secs(10), &mut rng);
                let visited: BTreeSet<String> = selected_names(&effects).into_iter().collect();
                assert_eq!(visited.len(), count, "{:?} missed items", strategy.roll_type());
            }
        }
    }

    #[test]
    fn test_terminates_once_duration_elapsed() {
        let pool = items(5);
        let mut rng = StdRng::seed_from_u64(5);
        let mut strategy = right_to_left(&pool, &mut rng);
        let total = Duration::from_secs(10);
        let (_, _, end) = run_to_commit(strategy.as_mut(), total, &mut rng);
        assert!(end >= total);
        // 最后一次延迟不超过 800ms
        assert!(end <= total + Duration::from_millis(800));
    }
}
