//! # Driver 模块
//!
//! 宿主主循环：把时钟接到引擎上。
//!
//! ```text
//! handle(Start) ──► loop { sleep_until(next_deadline); tick(now) } ──► Finished
//! ```
//!
//! 实时模式用 `Instant` 计时并真实等待；`--instant` 模式使用虚拟时钟，
//! 直接跳到下一个 deadline，不等待。

use std::time::{Duration, Instant};

use roll_runtime::{Item, RollEngine, RollEvent, RollInput};

/// 宿主时钟
pub trait Clock {
    /// 相对起点的当前时间
    fn now(&self) -> Duration;

    /// 等待到 `deadline`
    fn sleep_until(&mut self, deadline: Duration);
}

/// 真实时钟
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep_until(&mut self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// 虚拟时钟（不等待）
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Duration,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep_until(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }
}

/// 主循环
#[derive(Debug)]
pub struct Driver<C: Clock> {
    clock: C,
}

impl<C: Clock> Driver<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// 当前时间
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// 处理一个开始输入，驱动到本次抽取完成，返回最终条目
    ///
    /// 已有会话进行中（开始请求被忽略）时返回 None。
    /// 揭示类动画完成后的网格恢复不会等待。
    pub fn run(
        &mut self,
        engine: &mut RollEngine,
        input: RollInput,
        mut on_event: impl FnMut(&RollEvent),
    ) -> anyhow::Result<Option<Item>> {
        let events = engine.handle(input, self.clock.now())?;
        events.iter().for_each(&mut on_event);
        if !events
            .iter()
            .any(|e| matches!(e, RollEvent::Started { .. }))
        {
            return Ok(None);
        }

        while let Some(deadline) = engine.next_deadline() {
            self.clock.sleep_until(deadline);
            for event in engine.tick(self.clock.now()) {
                on_event(&event);
                if let RollEvent::Finished { item, .. } = event {
                    return Ok(Some(item));
                }
            }
        }

        tracing::warn!("调度队列已空，但抽取没有完成");
        Ok(None)
    }

    /// 驱动引擎直到没有待执行任务（包括网格恢复）
    pub fn drain(&mut self, engine: &mut RollEngine, mut on_event: impl FnMut(&RollEvent)) {
        while let Some(deadline) = engine.next_deadline() {
            self.clock.sleep_until(deadline);
            engine
                .tick(self.clock.now())
                .iter()
                .for_each(&mut on_event);
        }
    }
}

/// 事件的终端描述
pub fn describe(event: &RollEvent) -> String {
    match event {
        RollEvent::Started {
            roll_type,
            duration_ms,
            pool,
        } => format!(
            "▶ {} ({}), {} 秒, 候选 {} 个",
            roll_type.label(),
            roll_type,
            duration_ms / 1000,
            pool
        ),
        RollEvent::Selected { item } => format!("  · {}", item.name),
        RollEvent::Hidden { name } => format!("  ✕ {}", name),
        RollEvent::Revealed { name } => format!("  ◆ {}", name),
        RollEvent::Committed { item, .. } => format!("★ {}", item.name),
        RollEvent::Finished { item, roll_type } => {
            format!("✔ 结果: {} [{}]", item.name, roll_type)
        }
        RollEvent::TransientReset { .. } => "  ↺ 网格已恢复".to_string(),
        RollEvent::DisabledChanged { name, disabled } => {
            if *disabled {
                format!("已禁用: {}", name)
            } else {
                format!("已启用: {}", name)
            }
        }
        RollEvent::StatsReset => "统计已清空".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roll_runtime::{Catalog, RollStats, RollType};

    #[test]
    fn test_virtual_clock_never_goes_back() {
        let mut clock = VirtualClock::new();
        clock.sleep_until(Duration::from_secs(3));
        clock.sleep_until(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_run_to_finish_on_virtual_clock() {
        let mut engine = RollEngine::new(Catalog::builtin(), RollStats::new()).with_seed(12);
        let mut driver = Driver::new(VirtualClock::new());

        let mut events = Vec::new();
        let item = driver
            .run(
                &mut engine,
                RollInput::start_with("10", RollType::UpToDown),
                |e| events.push(e.clone()),
            )
            .unwrap()
            .unwrap();

        assert!(driver.now() >= Duration::from_secs(10));
        assert!(matches!(events.first(), Some(RollEvent::Started { .. })));
        assert_eq!(
            events.last(),
            Some(&RollEvent::Finished {
                item: item.clone(),
                roll_type: RollType::UpToDown
            })
        );
        assert_eq!(engine.stats().counts().get(&item.name), Some(&1));
    }

    #[test]
    fn test_drain_runs_transient_reset() {
        let mut engine = RollEngine::new(Catalog::builtin(), RollStats::new()).with_seed(3);
        let mut driver = Driver::new(VirtualClock::new());
        driver
            .run(
                &mut engine,
                RollInput::start_with("10", RollType::HideReveal),
                |_| {},
            )
            .unwrap();
        assert_eq!(engine.visible().len(), 1);

        let mut reset = false;
        driver.drain(&mut engine, |e| {
            reset |= matches!(e, RollEvent::TransientReset { .. })
        });
        assert!(reset);
        assert_eq!(engine.visible().len(), 15);
    }

    #[test]
    fn test_describe() {
        let line = describe(&RollEvent::Started {
            roll_type: RollType::HideReveal,
            duration_ms: 12_000,
            pool: 15,
        });
        assert!(line.contains("hide-reveal"));
        assert!(line.contains("12"));
        assert_eq!(describe(&RollEvent::StatsReset), "统计已清空");
    }
}
