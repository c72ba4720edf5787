//! # Teach Tools - 动作库与配置
//!
//! **依赖原则**: 只依赖 `teach-protocol`，不接触总线和工作线程
//!
//! ## 包含模块
//!
//! - `slot` - 动作槽位（1..=10）
//! - `library` - 动作库持久化格式（部分成功加载）
//! - `timestamp` - 动作时间戳格式
//! - `config` - 示教台配置（JSON / TOML）

pub mod config;
pub mod library;
pub mod slot;
pub mod timestamp;

// 重新导出常用类型
pub use config::{ArmLayout, BusSettings, ConfigError, EngineSettings, TeachConfig};
pub use library::{
    Action, ActionLibrary, DEFAULT_LIBRARY_FILE, LibraryError, LoadReport, MalformedRecord,
};
pub use slot::{InvalidSlot, SLOT_MAX, SLOT_MIN, Slot};
