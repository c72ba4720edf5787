//! 命令定义和实现

pub mod actions;
pub mod config;
pub mod mirror;
pub mod play;
pub mod record;
pub mod torque;

pub use actions::ActionsCommand;
pub use config::ConfigCommand;
pub use mirror::MirrorCommand;
pub use play::PlayCommand;
pub use record::RecordCommand;
pub use torque::TorqueCommand;
