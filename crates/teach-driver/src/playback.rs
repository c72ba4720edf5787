//! 回放引擎
//!
//! 在从臂上按采样点序列回放动作。相邻两点之间做缓动插值，
//! 步数由最大关节差决定（见 [`crate::interpolation`]），
//! 帧间延迟为 `base_delay / speed`。
//!
//! 段与段之间的衔接帧会写两次（上一段终点、下一段起点）。
//! 单点写入失败只记录日志，继续下一个点。

use crate::error::DriverError;
use crate::interpolation::{EasedSegment, round_position};
use crate::rig::SharedBus;
use crate::session::CancelToken;
use std::fmt;
use std::time::Duration;
use teach_bus::ServoBus;
use teach_protocol::{
    BASE_GOAL_SPEED, DEFAULT_ACCELERATION, JointVector, PositionRange, Register, RegisterValue,
};
use tracing::{debug, info, warn};

/// 最小速度倍率
pub const MIN_SPEED: f64 = 0.5;

/// 最大速度倍率
pub const MAX_SPEED: f64 = 2.0;

/// 默认帧间延迟（1.0 倍速）
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(30);

/// 速度倍率，保证位于 [`MIN_SPEED`, `MAX_SPEED`]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SpeedFactor(f64);

impl SpeedFactor {
    pub const NORMAL: SpeedFactor = SpeedFactor(1.0);

    /// 超出范围的值被截断（不拒绝）；NaN 被拒绝
    pub fn clamped(value: f64) -> Result<Self, DriverError> {
        if value.is_nan() {
            return Err(DriverError::InvalidParameter(
                "speed factor must be a number".to_string(),
            ));
        }

        let clamped = value.clamp(MIN_SPEED, MAX_SPEED);
        if clamped != value {
            warn!(
                "Speed factor {} out of range [{}, {}], clamped to {}",
                value, MIN_SPEED, MAX_SPEED, clamped
            );
        }
        Ok(Self(clamped))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// 按倍率缩放后的帧间延迟
    pub fn scale_delay(self, base_delay: Duration) -> Duration {
        Duration::from_nanos((base_delay.as_nanos() as f64 / self.0).round() as u64)
    }

    /// 按倍率缩放后的舵机目标速度
    pub fn scale_goal_speed(self, base_speed: i32) -> i32 {
        round_position(f64::from(base_speed) * self.0)
    }
}

impl Default for SpeedFactor {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for SpeedFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}x", self.0)
    }
}

/// 回放配置
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// 1.0 倍速下的帧间延迟
    pub base_delay: Duration,

    /// 回放前写入从臂的加速度
    pub acceleration: i32,

    /// 1.0 倍速下的舵机目标速度
    pub base_speed: i32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            acceleration: DEFAULT_ACCELERATION,
            base_speed: BASE_GOAL_SPEED,
        }
    }
}

/// 回放结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// 已完成的插值段数
    pub segments: usize,
    /// 成功写入的帧数
    pub frames_written: usize,
    pub write_errors: usize,
    /// 是否被中途取消
    pub cancelled: bool,
}

/// 回放引擎
pub struct PlaybackEngine<B: ServoBus> {
    config: PlaybackConfig,
    slave: SharedBus<B>,
}

impl<B: ServoBus> PlaybackEngine<B> {
    pub fn new(config: PlaybackConfig, slave: SharedBus<B>) -> Self {
        Self { config, slave }
    }

    /// 检查采样点的关节数与示教台一致、位置在设备有效范围内
    ///
    /// 在启动工作线程之前调用，任何一个采样点不合格都不会写入舵机。
    pub fn validate(waypoints: &[JointVector], joint_count: usize) -> Result<(), DriverError> {
        let range = PositionRange::default();
        for (index, waypoint) in waypoints.iter().enumerate() {
            if waypoint.len() != joint_count {
                return Err(DriverError::InvalidParameter(format!(
                    "waypoint {} has {} joints, rig has {}",
                    index,
                    waypoint.len(),
                    joint_count
                )));
            }
            waypoint.validate(&range).map_err(|e| {
                DriverError::InvalidParameter(format!("waypoint {}: {}", index, e))
            })?;
        }
        Ok(())
    }

    /// 回放整个序列
    ///
    /// 少于 2 个采样点时什么都不做（不写寄存器）。
    pub fn run(&self, waypoints: &[JointVector], speed: SpeedFactor, cancel: &CancelToken) -> PlaybackReport {
        let mut report = PlaybackReport::default();

        if waypoints.len() < 2 {
            debug!("Playback skipped: {} waypoint(s)", waypoints.len());
            return report;
        }

        self.configure_slave(speed);

        let delay = speed.scale_delay(self.config.base_delay);
        let total = waypoints.len() - 1;
        info!("Playing {} waypoints at {} (frame delay {:?})", waypoints.len(), speed, delay);

        for (index, pair) in waypoints.windows(2).enumerate() {
            let segment = match EasedSegment::auto(&pair[0], &pair[1]) {
                Ok(segment) => segment,
                Err(e) => {
                    warn!("Skipping segment {}: {}", index, e);
                    continue;
                },
            };

            for frame in segment {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    info!("Playback cancelled after {}/{} segments", report.segments, total);
                    return report;
                }

                let written = self.slave.lock().write_goal_positions(&frame);
                match written {
                    Ok(()) => report.frames_written += 1,
                    Err(e) => {
                        report.write_errors += 1;
                        warn!("Error writing playback frame {}: {}", frame, e);
                    },
                }

                std::thread::sleep(delay);
            }

            report.segments += 1;
            debug!("Playback progress: {}/{}", report.segments, total);
        }

        info!(
            "Playback finished: {} frames written ({} errors)",
            report.frames_written, report.write_errors
        );
        report
    }

    /// 设置从臂加速度和按倍率缩放的速度
    ///
    /// 失败只记录日志，回放继续。
    fn configure_slave(&self, speed: SpeedFactor) {
        let goal_speed = speed.scale_goal_speed(self.config.base_speed);
        let mut bus = self.slave.lock();

        if let Err(e) = bus.write(Register::Acceleration, RegisterValue::Scalar(self.config.acceleration)) {
            warn!("Failed to set playback acceleration: {}", e);
        }
        if let Err(e) = bus.write(Register::GoalSpeed, RegisterValue::Scalar(goal_speed)) {
            warn!("Failed to set playback speed: {}", e);
        }
    }
}
