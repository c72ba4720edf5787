//! 循环频率统计
//!
//! 使用固定时间窗口统计循环频率（Hz），用于镜像循环的性能监控。

use std::time::{Duration, Instant};

/// 默认统计窗口
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(1);

/// 固定窗口频率计数器
#[derive(Debug, Clone)]
pub struct RateWindow {
    window: Duration,
    window_start: Instant,
    ticks: u64,
    last_rate: Option<f64>,
}

impl RateWindow {
    pub fn new(window: Duration) -> Self {
        Self::starting_at(window, Instant::now())
    }

    pub fn starting_at(window: Duration, now: Instant) -> Self {
        Self {
            window,
            window_start: now,
            ticks: 0,
            last_rate: None,
        }
    }

    /// 记录一次循环
    ///
    /// 窗口结束时返回该窗口的平均频率，并开始新窗口。
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        self.ticks += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        let rate = self.ticks as f64 / elapsed.as_secs_f64();
        self.window_start = now;
        self.ticks = 0;
        self.last_rate = Some(rate);
        Some(rate)
    }

    /// 最近一个完整窗口的频率
    pub fn last_rate(&self) -> Option<f64> {
        self.last_rate
    }
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_over_window() {
        let start = Instant::now();
        let mut rate = RateWindow::starting_at(Duration::from_secs(1), start);

        for i in 1..30 {
            assert_eq!(rate.tick(start + Duration::from_millis(i * 33)), None);
        }
        let hz = rate.tick(start + Duration::from_secs(1)).unwrap();
        assert!((hz - 30.0).abs() < 1e-9);
        assert_eq!(rate.last_rate(), Some(hz));
    }

    #[test]
    fn test_window_resets() {
        let start = Instant::now();
        let mut rate = RateWindow::starting_at(Duration::from_millis(100), start);

        assert!(rate.tick(start + Duration::from_millis(100)).is_some());
        assert_eq!(rate.tick(start + Duration::from_millis(150)), None);
        let hz = rate.tick(start + Duration::from_millis(200)).unwrap();
        assert!((hz - 20.0).abs() < 1e-9);
    }
}
