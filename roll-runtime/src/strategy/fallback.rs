//! # Fallback 模块
//!
//! 旧版抽取方式：每一步从候选池中有放回地随机抽取，没有顺序；
//! 进度走满后再抽一次作为最终结果。

use rand::Rng;
use rand::rngs::StdRng;
use std::time::Duration;

use super::{Next, RollStrategy, RollType, Step, StepContext, StepEffect};
use crate::catalog::Item;
use crate::timing::{self, LEGACY_MAX_DELAY_MS, LEGACY_MIN_DELAY_MS};

/// 有放回随机策略
#[derive(Debug)]
pub struct Fallback {
    pool: Vec<Item>,
}

impl Fallback {
    /// 创建策略
    pub fn new(pool: &[Item]) -> Self {
        Self {
            pool: pool.to_vec(),
        }
    }

    fn draw(&self, rng: &mut StdRng) -> Item {
        let index = rng.random_range(0..self.pool.len());
        self.pool[index].clone()
    }
}

impl RollStrategy for Fallback {
    fn roll_type(&self) -> RollType {
        RollType::Fallback
    }

    fn initial_delay(&self) -> Duration {
        timing::millis(LEGACY_MIN_DELAY_MS)
    }

    fn step(&mut self, ctx: &StepContext, rng: &mut StdRng) -> Step {
        let progress = ctx.progress();
        let delay = timing::eased_delay(LEGACY_MIN_DELAY_MS, LEGACY_MAX_DELAY_MS, progress, 1.0);

        let shown = self.draw(rng);
        if progress < 1.0 {
            return Step::show_then(shown, timing::millis(delay));
        }

        let last = self.draw(rng);
        Step {
            effects: vec![StepEffect::Select(shown), StepEffect::Select(last.clone())],
            next: Next::Commit(last),
        }
    }
}

/// 工厂函数
pub fn build(pool: &[Item], _rng: &mut StdRng) -> Box<dyn RollStrategy> {
    Box::new(Fallback::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{items, run_to_commit, selected_names};
    use rand::SeedableRng;

    #[test]
    fn test_fallback_commits_after_duration() {
        let pool = items(5);
        let mut rng = StdRng::seed_from_u64(8);
        let mut strategy = build(&pool, &mut rng);
        assert_eq!(strategy.initial_delay(), Duration::from_millis(60));

        let total = Duration::from_secs(10);
        let (effects, committed, end) = run_to_commit(strategy.as_mut(), total, &mut rng);
        assert!(end >= total);
        assert!(pool.contains(&committed));
        assert_eq!(selected_names(&effects).last(), Some(&committed.name));
    }

    #[test]
    fn test_fallback_delay_window() {
        let pool = items(3);
        let mut strategy = Fallback::new(&pool);
        let mut rng = StdRng::seed_from_u64(1);
        let total = Duration::from_secs(10);
        let mut now = Duration::ZERO;
        loop {
            let ctx = StepContext {
                now,
                start: Duration::ZERO,
                total,
            };
            match strategy.step(&ctx, &mut rng).next {
                Next::Continue(delay) => {
                    assert!(delay >= Duration::from_millis(60));
                    assert!(delay <= Duration::from_millis(350));
                    now += delay;
                }
                Next::Commit(_) => break,
            }
        }
    }
}
