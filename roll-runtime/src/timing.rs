//! # Timing 模块
//!
//! 进度与缓动延迟计算。全部是纯函数，不读取真实时钟。
//!
//! 时间统一用 `Duration` 表示（相对宿主定义的起点），
//! 延迟计算在毫秒浮点域中进行，最后通过 [`millis`] 转回 `Duration`。

use std::time::Duration;

use rand::Rng;

/// 方向遍历的最小步进延迟（毫秒）
pub const DEFAULT_MIN_DELAY_MS: f64 = 50.0;
/// 旧版随机模式的最小延迟（毫秒）
pub const LEGACY_MIN_DELAY_MS: f64 = 60.0;
/// 旧版随机模式的最大延迟（毫秒）
pub const LEGACY_MAX_DELAY_MS: f64 = 350.0;
/// 展示最终结果到完成回调之间的停顿（毫秒）
pub const SETTLE_DELAY_MS: f64 = 500.0;
/// 遍历/揭示模式第一步之前的延迟（毫秒）
pub const TRAVERSAL_START_DELAY_MS: f64 = 100.0;
/// 揭示类模式结束后恢复网格的延迟（毫秒）
pub const TRANSIENT_RESET_DELAY_MS: f64 = 1500.0;

/// 三次缓出：`1 - (1 - t)^3`
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// 计算归一化进度，结果在 `[0, 1]`
///
/// `total` 为零时视为已经结束。
pub fn progress(start: Duration, now: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_sub(start);
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}

/// 缓动延迟：`min + (max - min) * ease(progress) * factor`
///
/// `factor` 由调用方提供（抖动因子），不抖动时传 `1.0`。
pub fn eased_delay(min_ms: f64, max_ms: f64, progress: f64, factor: f64) -> f64 {
    min_ms + (max_ms - min_ms) * ease_out_cubic(progress) * factor
}

/// 抽取一个 `[0.5, 1.0]` 的减速抖动因子
pub fn jitter_factor<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    0.5 + rng.random::<f64>() * 0.5
}

/// 隐藏/揭示模式的基础速度：`max(200, total / 20)`
pub fn base_speed(total_ms: f64) -> f64 {
    (total_ms / 20.0).max(200.0)
}

/// 方向遍历的最大延迟：`min(800, 50 + 秒数 * 200)`
pub fn max_delay_for(total_ms: f64) -> f64 {
    let seconds = total_ms / 1000.0;
    (50.0 + seconds * 200.0).min(800.0)
}

/// 单步隐藏延迟：`floor(total / 40)` 限制在 `[150, 400]`（10 秒约 250ms）
pub fn step_delay_for(total_ms: f64) -> f64 {
    (total_ms / 40.0).floor().clamp(150.0, 400.0)
}

/// 毫秒浮点数转 `Duration`（负数与 NaN 视为 0），精确到纳秒
pub fn millis(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_nanos((ms * 1_000_000.0).round() as u64)
    } else {
        Duration::ZERO
    }
}

/// `Duration` 转整数毫秒，超出 `u64` 时饱和
pub fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// `Duration` 转毫秒浮点数
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
