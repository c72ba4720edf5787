//! Teach SDK - 主从舵机示教台 Rust SDK
//!
//! 拖动主臂录制动作、实时镜像到从臂、按速度倍率回放。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 寄存器、关节向量、位置范围
//! - **总线层** (`bus`): `ServoBus` 抽象（可选 `mock` 实现）
//! - **驱动层** (`driver`): 模式控制器、录制 / 镜像 / 回放引擎
//! - **工具层** (`tools`): 动作库持久化、配置加载
//!
//! # 快速开始
//!
//! ```rust,ignore
//! use teach_sdk::prelude::*;
//!
//! let config = TeachConfig::load_or_default("config.json");
//! let rig = RigBuilder::new()
//!     .master(master_bus)
//!     .slave(slave_bus)
//!     .config(rig_config(&config))
//!     .build()?;
//!
//! let session = rig.start_recording()?;
//! // ... 操作员拖动主臂 ...
//! let mut recording = rig.stop(session)?;
//! recording.trim(true, true);
//!
//! let mut library = ActionLibrary::load_from_file(DEFAULT_LIBRARY_FILE)?.into_library();
//! library.save(1, recording.into_waypoints(), Some("wave"))?;
//! library.save_to_file(DEFAULT_LIBRARY_FILE)?;
//! ```

pub use teach_bus as bus;
pub use teach_driver as driver;
pub use teach_protocol as protocol;
pub use teach_tools as tools;

mod logging;
mod rig_config;

// Prelude 模块
pub mod prelude;

// --- 用户以此为界 ---

pub use logging::{DEFAULT_LOG_FILTER, init_logging};
pub use rig_config::rig_config;

pub use teach_bus::{BusError, ServoBus};
pub use teach_driver::{
    Arm, DriverError, Mode, RigBuilder, RigConfig, SessionHandle, TeachingRig,
};
pub use teach_protocol::{JointVector, ProtocolError, Register, RegisterValue};
pub use teach_tools::{
    Action, ActionLibrary, ConfigError, LibraryError, LoadReport, Slot, TeachConfig,
};
