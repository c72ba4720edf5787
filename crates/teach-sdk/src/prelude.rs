//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use teach_sdk::prelude::*;
//! ```

// 示教台（推荐入口）
pub use teach_driver::{Arm, Mode, RigBuilder, RigConfig, SessionHandle, TeachingRig};

// 引擎配置与会话结果
pub use teach_driver::{MirrorConfig, PlaybackConfig, RecorderConfig};
pub use teach_driver::{MirrorStats, PlaybackReport, Recording, SpeedFactor};

// 总线（常用 Trait）
pub use teach_bus::ServoBus;

// 数据类型
pub use teach_protocol::{JointVector, Register, RegisterValue};

// 动作库与配置
pub use teach_tools::{Action, ActionLibrary, DEFAULT_LIBRARY_FILE, Slot, TeachConfig};

pub use crate::rig_config::rig_config;

// 错误类型
pub use teach_bus::BusError;
pub use teach_driver::DriverError;
pub use teach_protocol::ProtocolError;
pub use teach_tools::{ConfigError, LibraryError};
