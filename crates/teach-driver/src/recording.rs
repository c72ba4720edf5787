//! 录制引擎
//!
//! 在专用工作线程上按采样间隔读取主臂位置，生成采样点序列。
//!
//! # 循环
//!
//! 1. 距上次采样不足 `sample_interval` 时短暂让出（不空转）
//! 2. 读取主臂位置；失败则记录日志，不推进采样时钟，下一轮重试。
//!    致命错误（设备断开等）按 error 级别记录并单独计数，同样重试
//! 3. （可选）同一轮内把位置转发给从臂，实现"边镜像边录制"
//! 4. 推入平滑窗口，窗口满后把平均值追加到录制缓冲区
//!
//! 停止后缓冲区成为候选动作，可先裁剪首尾抖动再保存。

use crate::rig::SharedBus;
use crate::session::CancelToken;
use crate::smoothing::{DEFAULT_SMOOTHING_WINDOW, MovingAverage};
use std::time::{Duration, Instant};
use teach_bus::ServoBus;
use teach_protocol::{BASE_GOAL_SPEED, DEFAULT_ACCELERATION, JointVector, Register, RegisterValue};
use tracing::{debug, error, info, warn};

/// 默认采样间隔（100Hz）
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// 首尾裁剪帧数
pub const TRIM_FRAMES: usize = 3;

/// 录制配置
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    /// 采样间隔
    pub sample_interval: Duration,

    /// 平滑窗口（0 或 1 表示关闭）
    pub smoothing_window: usize,

    /// 录制时同步驱动从臂
    pub mirror_to_slave: bool,

    /// 未到采样时刻时的让出时长
    pub idle_yield: Duration,

    /// 镜像录制前写入从臂的加速度
    pub slave_acceleration: i32,

    /// 镜像录制前写入从臂的目标速度
    pub slave_goal_speed: i32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            mirror_to_slave: false,
            idle_yield: Duration::from_millis(1),
            slave_acceleration: DEFAULT_ACCELERATION,
            slave_goal_speed: BASE_GOAL_SPEED,
        }
    }
}

impl RecorderConfig {
    /// 镜像录制预设：关闭平滑以降低端到端延迟
    pub fn mirrored(sample_interval: Duration) -> Self {
        Self {
            sample_interval,
            smoothing_window: 0,
            mirror_to_slave: true,
            ..Self::default()
        }
    }
}

/// 录制结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    waypoints: Vec<JointVector>,
    duration: Duration,
    read_errors: u64,
    fatal_errors: u64,
}

impl Recording {
    pub fn new(waypoints: Vec<JointVector>) -> Self {
        Self {
            waypoints,
            ..Self::default()
        }
    }

    pub fn waypoints(&self) -> &[JointVector] {
        &self.waypoints
    }

    pub fn into_waypoints(self) -> Vec<JointVector> {
        self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// 录制时长
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// 读取失败次数
    pub fn read_errors(&self) -> u64 {
        self.read_errors
    }

    /// 其中的致命错误数（设备断开等）
    pub fn fatal_errors(&self) -> u64 {
        self.fatal_errors
    }

    /// 裁剪首尾各 [`TRIM_FRAMES`] 帧，去除起停抖动
    ///
    /// 尾部裁剪只在裁剪后仍剩至少 `TRIM_FRAMES` 帧时生效。
    pub fn trim(&mut self, trim_start: bool, trim_end: bool) {
        let before = self.waypoints.len();

        if trim_start {
            let n = TRIM_FRAMES.min(self.waypoints.len());
            self.waypoints.drain(..n);
        }

        if trim_end && self.waypoints.len() >= 2 * TRIM_FRAMES {
            let keep = self.waypoints.len() - TRIM_FRAMES;
            self.waypoints.truncate(keep);
        }

        debug!("Trimmed recording: {} -> {} waypoints", before, self.waypoints.len());
    }
}

/// 录制引擎
pub struct RecordingEngine<B: ServoBus> {
    config: RecorderConfig,
    master: SharedBus<B>,
    slave: Option<SharedBus<B>>,
}

impl<B: ServoBus> RecordingEngine<B> {
    /// `slave` 仅在 `config.mirror_to_slave` 为真时使用
    pub fn new(config: RecorderConfig, master: SharedBus<B>, slave: Option<SharedBus<B>>) -> Self {
        Self {
            config,
            master,
            slave,
        }
    }

    /// 运行录制循环直到取消
    pub fn run(self, cancel: &CancelToken) -> Recording {
        let slave = if self.config.mirror_to_slave {
            self.slave.as_ref()
        } else {
            None
        };

        if let Some(slave) = slave {
            self.preset_slave(slave);
        }

        let mut filter = MovingAverage::new(self.config.smoothing_window);
        let mut waypoints = Vec::new();
        let mut read_errors = 0u64;
        let mut fatal_errors = 0u64;

        let start = Instant::now();
        let mut last_sample = start;

        info!(
            "Recording started (interval {:?}, smoothing window {}, mirror {})",
            self.config.sample_interval,
            self.config.smoothing_window,
            slave.is_some()
        );

        while !cancel.is_cancelled() {
            let now = Instant::now();
            if now.duration_since(last_sample) < self.config.sample_interval {
                std::thread::sleep(self.config.idle_yield);
                continue;
            }

            let read = self.master.lock().read_positions();
            let positions = match read {
                Ok(positions) => positions,
                Err(e) => {
                    // 不推进采样时钟，下一轮立即重试
                    read_errors += 1;
                    if e.is_fatal() {
                        fatal_errors += 1;
                        error!("Fatal error reading master positions during recording: {}", e);
                    } else {
                        warn!("Error reading master positions during recording: {}", e);
                    }
                    std::thread::sleep(self.config.idle_yield);
                    continue;
                },
            };
            last_sample = now;

            if let Some(slave) = slave {
                let written = slave.lock().write_goal_positions(&positions);
                if let Err(e) = written {
                    warn!("Error mirroring to slave during recording: {}", e);
                }
            }

            if let Some(sample) = filter.push(positions) {
                debug!(
                    "Recording... {:.2}s, positions: {}",
                    now.duration_since(start).as_secs_f64(),
                    sample
                );
                waypoints.push(sample);
            }
        }

        let duration = start.elapsed();
        info!(
            "Recording finished: {} waypoints in {:.2?} ({} read errors)",
            waypoints.len(),
            duration,
            read_errors
        );

        Recording {
            waypoints,
            duration,
            read_errors,
            fatal_errors,
        }
    }

    /// 镜像录制前一次性设置从臂加速度和速度
    fn preset_slave(&self, slave: &SharedBus<B>) {
        let mut bus = slave.lock();
        let presets = [
            (Register::Acceleration, self.config.slave_acceleration),
            (Register::GoalSpeed, self.config.slave_goal_speed),
        ];
        for (register, value) in presets {
            if let Err(e) = bus.write(register, RegisterValue::Scalar(value)) {
                warn!("Failed to preset slave {}: {}", register, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Recording {
        Recording::new((0..n as i32).map(|i| JointVector::from([i])).collect())
    }

    fn values(recording: &Recording) -> Vec<i32> {
        recording.waypoints().iter().map(|w| w[0]).collect()
    }

    #[test]
    fn test_trim_both_ends() {
        let mut recording = numbered(10);
        recording.trim(true, true);
        assert_eq!(values(&recording), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_trim_start_only() {
        let mut recording = numbered(5);
        recording.trim(true, false);
        assert_eq!(values(&recording), vec![3, 4]);
    }

    #[test]
    fn test_trim_end_skipped_when_too_short() {
        // 尾部裁剪会剩下不足 3 帧，跳过
        let mut recording = numbered(5);
        recording.trim(false, true);
        assert_eq!(recording.len(), 5);

        let mut recording = numbered(6);
        recording.trim(false, true);
        assert_eq!(values(&recording), vec![0, 1, 2]);
    }

    #[test]
    fn test_trim_short_recording() {
        let mut recording = numbered(2);
        recording.trim(true, true);
        assert!(recording.is_empty());
    }

    #[test]
    fn test_mirrored_preset() {
        let config = RecorderConfig::mirrored(Duration::from_millis(33));
        assert!(config.mirror_to_slave);
        assert_eq!(config.smoothing_window, 0);
        assert_eq!(config.sample_interval, Duration::from_millis(33));
    }
}
