//! # Elimination 模块
//!
//! 无放回的逐个淘汰：每一步从剩余集合中随机取出一个条目展示，
//! 随后隐藏（`hide-reveal`）或翻开（`reverse-reveal`）它。
//!
//! ## 状态转换
//!
//! ```text
//! Drawing (剩余 > 2) --抽取--> Drawing
//! Drawing (剩余 == 2) --展示失败者--> Winner(winner)
//! Drawing (剩余 == 1) --直接提交--> Done
//! Winner(winner) --展示胜者--> Done
//! ```

use rand::Rng;
use rand::rngs::StdRng;

use super::{Next, RollStrategy, RollType, Step, StepContext, StepEffect};
use crate::catalog::Item;
use crate::timing;

/// 淘汰后卡片的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EliminationMode {
    /// 隐藏卡片
    Hide,
    /// 翻开卡片
    Reveal,
}

impl EliminationMode {
    fn roll_type(self) -> RollType {
        match self {
            Self::Hide => RollType::HideReveal,
            Self::Reveal => RollType::ReverseReveal,
        }
    }

    /// 展示失败者之后、展示胜者之前的额外停顿
    fn final_delay_ms(self, step_delay_ms: f64) -> f64 {
        match self {
            Self::Hide => (step_delay_ms * 5.0).min(1000.0),
            Self::Reveal => (step_delay_ms * 10.0).min(2000.0),
        }
    }

    fn mark(self, name: String, after_ms: f64) -> StepEffect {
        let after = timing::millis(after_ms);
        match self {
            Self::Hide => StepEffect::Hide { name, after },
            Self::Reveal => StepEffect::Reveal { name, after },
        }
    }
}

#[derive(Debug)]
enum Phase {
    Drawing,
    Winner(Item),
    Done,
}

/// 淘汰策略状态
#[derive(Debug)]
pub struct Elimination {
    mode: EliminationMode,
    remaining: Vec<Item>,
    phase: Phase,
}

impl Elimination {
    /// 以完整候选池作为初始工作集
    pub fn new(mode: EliminationMode, pool: &[Item]) -> Self {
        Self {
            mode,
            remaining: pool.to_vec(),
            phase: Phase::Drawing,
        }
    }

    /// 剩余工作集大小
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    fn draw(&mut self, ctx: &StepContext, rng: &mut StdRng) -> Step {
        let total_ms = ctx.total_ms();
        let step_delay = timing::step_delay_for(total_ms);

        match self.remaining.len() {
            0 | 1 => {
                // 工作集只有一个条目：无需淘汰，直接提交
                self.phase = Phase::Done;
                let Some(winner) = self.remaining.pop() else {
                    return self.stalled();
                };
                let mut effects = vec![StepEffect::Select(winner.clone())];
                if self.mode == EliminationMode::Reveal {
                    effects.push(self.mode.mark(winner.name.clone(), 0.0));
                }
                Step {
                    effects,
                    next: Next::Commit(winner),
                }
            }
            2 => {
                let loser_index = rng.random_range(0..2);
                let loser = self.remaining.remove(loser_index);
                let winner = self.remaining.remove(0);
                self.phase = Phase::Winner(winner);

                let final_delay = self.mode.final_delay_ms(step_delay);
                Step {
                    effects: vec![
                        StepEffect::Select(loser.clone()),
                        self.mode.mark(loser.name, step_delay),
                    ],
                    next: Next::Continue(timing::millis(step_delay + final_delay)),
                }
            }
            len => {
                let index = rng.random_range(0..len);
                let item = self.remaining.remove(index);

                let base = timing::base_speed(total_ms);
                let eased = timing::eased_delay(base * 0.5, base * 2.0, ctx.progress(), 1.0);
                let next_delay = eased.max(step_delay + 50.0);

                tracing::trace!(name = %item.name, remaining = self.remaining.len(), "eliminated");
                Step {
                    effects: vec![
                        StepEffect::Select(item.clone()),
                        self.mode.mark(item.name, step_delay),
                    ],
                    next: Next::Continue(timing::millis(next_delay)),
                }
            }
        }
    }

    fn stalled(&self) -> Step {
        // 只有在空候选池上被调用时才会到达这里
        Step {
            effects: Vec::new(),
            next: Next::Continue(timing::millis(timing::SETTLE_DELAY_MS)),
        }
    }
}

impl RollStrategy for Elimination {
    fn roll_type(&self) -> RollType {
        self.mode.roll_type()
    }

    fn step(&mut self, ctx: &StepContext, rng: &mut StdRng) -> Step {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Drawing => {
                self.phase = Phase::Drawing;
                self.draw(ctx, rng)
            }
            Phase::Winner(winner) => {
                let mut effects = vec![StepEffect::Select(winner.clone())];
                if self.mode == EliminationMode::Reveal {
                    effects.push(self.mode.mark(winner.name.clone(), 0.0));
                }
                Step {
                    effects,
                    next: Next::Commit(winner),
                }
            }
            Phase::Done => self.stalled(),
        }
    }
}

/// 逐个隐藏
pub fn hide_reveal(pool: &[Item], _rng: &mut StdRng) -> Box<dyn RollStrategy> {
    Box::new(Elimination::new(EliminationMode::Hide, pool))
}

/// 逐个翻开
pub fn reverse_reveal(pool: &[Item], _rng: &mut StdRng) -> Box<dyn RollStrategy> {
    Box::new(Elimination::new(EliminationMode::Reveal, pool))
}
