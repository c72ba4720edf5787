//! 镜像引擎
//!
//! 以固定频率读取主臂位置并写入从臂目标位置。
//!
//! 每帧：读主臂 → 写从臂 → 睡眠 `max(0, interval - elapsed)`（spin_sleep 精确等待）。
//! 单帧失败只记录日志，不终止循环。致命错误（设备断开等）按 error 级别记录并单独计数，
//! 循环照常继续，设备重新接上后自动恢复转发。
//! 每个统计窗口的实际频率低于 `fps - rate_tolerance_hz` 时告警。

use crate::fps_stats::{DEFAULT_RATE_WINDOW, RateWindow};
use crate::rig::SharedBus;
use crate::session::CancelToken;
use std::time::{Duration, Instant};
use teach_bus::{BusError, ServoBus};
use tracing::{debug, error, info, warn};

/// 默认镜像频率
pub const DEFAULT_MIRROR_FPS: u32 = 30;

/// 镜像配置
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorConfig {
    /// 目标频率（Hz）
    pub fps: u32,

    /// 实际频率低于 `fps - rate_tolerance_hz` 时告警
    pub rate_tolerance_hz: f64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_MIRROR_FPS,
            rate_tolerance_hz: 1.0,
        }
    }
}

impl MirrorConfig {
    /// 帧间隔
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps.max(1)))
    }
}

/// 镜像统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorStats {
    /// 成功转发的帧数
    pub frames: u64,
    pub read_errors: u64,
    pub write_errors: u64,
    /// 最近一个统计窗口的实际频率
    pub achieved_hz: Option<f64>,
    /// 实际频率低于告警阈值的统计窗口数
    pub slow_windows: u64,
    /// 其中的致命错误数（读写错误的子集）
    pub fatal_errors: u64,
    pub duration: Duration,
}

/// 镜像引擎
pub struct MirroringEngine<B: ServoBus> {
    config: MirrorConfig,
    master: SharedBus<B>,
    slave: SharedBus<B>,
}

impl<B: ServoBus> MirroringEngine<B> {
    pub fn new(config: MirrorConfig, master: SharedBus<B>, slave: SharedBus<B>) -> Self {
        Self {
            config,
            master,
            slave,
        }
    }

    /// 运行镜像循环直到取消
    pub fn run(self, cancel: &CancelToken) -> MirrorStats {
        let interval = self.config.interval();
        let min_rate = f64::from(self.config.fps) - self.config.rate_tolerance_hz;
        let sleeper = spin_sleep::SpinSleeper::default();

        let mut stats = MirrorStats::default();
        let mut rate = RateWindow::new(DEFAULT_RATE_WINDOW);
        let start = Instant::now();

        info!("Mirroring started at {} Hz", self.config.fps);

        while !cancel.is_cancelled() {
            let frame_start = Instant::now();

            self.forward_frame(&mut stats);

            let elapsed = frame_start.elapsed();
            if let Some(remaining) = interval.checked_sub(elapsed) {
                sleeper.sleep(remaining);
            }

            if let Some(hz) = rate.tick(Instant::now()) {
                if hz < min_rate {
                    stats.slow_windows += 1;
                    warn!("Mirroring rate {:.1} Hz below target {} Hz", hz, self.config.fps);
                } else {
                    debug!("Mirroring at {:.1} Hz", hz);
                }
            }
        }

        stats.achieved_hz = rate.last_rate();
        stats.duration = start.elapsed();
        info!(
            "Mirroring stopped: {} frames in {:.2?} ({} read errors, {} write errors, {} fatal)",
            stats.frames, stats.duration, stats.read_errors, stats.write_errors, stats.fatal_errors
        );
        stats
    }

    /// 转发一帧：读主臂 → 写从臂
    fn forward_frame(&self, stats: &mut MirrorStats) {
        let read = self.master.lock().read_positions();
        let positions = match read {
            Ok(positions) => positions,
            Err(e) => {
                stats.read_errors += 1;
                record_error(stats, "reading master positions", &e);
                return;
            },
        };

        let written = self.slave.lock().write_goal_positions(&positions);
        match written {
            Ok(()) => stats.frames += 1,
            Err(e) => {
                stats.write_errors += 1;
                record_error(stats, "writing slave positions", &e);
            },
        }
    }
}

fn record_error(stats: &mut MirrorStats, op: &str, e: &BusError) {
    if e.is_fatal() {
        stats.fatal_errors += 1;
        error!("Fatal bus error {} during mirroring: {}", op, e);
    } else {
        warn!("Error {} during mirroring: {}", op, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval() {
        let config = MirrorConfig::default();
        let interval = config.interval();
        assert_eq!(interval, Duration::from_nanos(33_333_333));

        let fast = MirrorConfig {
            fps: 100,
            ..Default::default()
        };
        assert_eq!(fast.interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_zero_fps_does_not_divide_by_zero() {
        let config = MirrorConfig {
            fps: 0,
            ..Default::default()
        };
        assert_eq!(config.interval(), Duration::from_secs(1));
    }
}
