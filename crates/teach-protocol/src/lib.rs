//! # Teach Protocol
//!
//! 舵机示教台的协议层定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `registers`: 寄存器名称与写入值
//! - `joint`: 关节位置向量 `JointVector` 与位置范围
//! - `constants`: 协议常量定义
//!
//! 总线传输（串口枚举、握手、寄存器读写原语）不在本 crate 范围内，
//! 见 `teach-bus`。

pub mod constants;
pub mod joint;
pub mod registers;

// 重新导出常用类型
pub use constants::*;
pub use joint::{JointVector, PositionRange};
pub use registers::{Register, RegisterValue};

use thiserror::Error;

/// 协议层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown register: {0}")]
    UnknownRegister(String),

    #[error("Joint count mismatch: expected {expected}, got {actual}")]
    JointCountMismatch { expected: usize, actual: usize },

    #[error("Joint {index} position {value} outside [{min}, {max}]")]
    PositionOutOfRange {
        index: usize,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("Empty joint vector")]
    EmptyVector,
}
