//! 驱动层模块
//!
//! 本模块提供主从示教台的运行时功能，包括：
//! - 模式控制器（录制 / 镜像 / 回放互斥，协作式取消）
//! - 录制引擎（定时采样 + 滑动平均平滑，可边镜像边录制）
//! - 镜像引擎（固定频率主臂 → 从臂转发）
//! - 回放引擎（二次缓动插值 + 速度倍率）
//!
//! # 使用场景
//!
//! 所有总线 IO 都在后台工作线程中进行；前台只发出请求和停止信号。
//! 总线实现见 `teach-bus`，动作库与配置见 `teach-tools`。

mod builder;
mod error;
mod fps_stats;
pub mod interpolation;
pub mod mirroring;
pub mod mode;
pub mod playback;
pub mod recording;
mod rig;
pub mod session;
pub mod smoothing;

pub use builder::RigBuilder;
pub use error::DriverError;
pub use fps_stats::{DEFAULT_RATE_WINDOW, RateWindow};
pub use interpolation::{EasedSegment, ease_in_out_quad, interpolate, step_count};
pub use mirroring::{MirrorConfig, MirrorStats, MirroringEngine};
pub use mode::{AtomicMode, Mode};
pub use playback::{PlaybackConfig, PlaybackEngine, PlaybackReport, SpeedFactor};
pub use recording::{RecorderConfig, Recording, RecordingEngine, TRIM_FRAMES};
pub use rig::{Arm, RigConfig, SharedBus, TeachingRig};
pub use session::{CancelToken, DEFAULT_STOP_TIMEOUT, ModeController, SessionHandle};
pub use smoothing::{DEFAULT_SMOOTHING_WINDOW, MovingAverage};
