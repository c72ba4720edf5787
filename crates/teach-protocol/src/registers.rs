//! 寄存器定义
//!
//! 示教流程只用到舵机控制表中的 5 个寄存器，
//! 名称与总线驱动中的控制表名称保持一致（如 `Present_Position`）。

use crate::{JointVector, ProtocolError};
use std::fmt;
use std::str::FromStr;

/// 示教流程使用的寄存器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// 当前位置（只读）
    PresentPosition,
    /// 目标位置
    GoalPosition,
    /// 目标速度
    GoalSpeed,
    /// 加速度
    Acceleration,
    /// 扭矩开关
    TorqueEnable,
}

impl Register {
    /// 所有寄存器
    pub const ALL: [Register; 5] = [
        Register::PresentPosition,
        Register::GoalPosition,
        Register::GoalSpeed,
        Register::Acceleration,
        Register::TorqueEnable,
    ];

    /// 控制表中的寄存器名称
    pub const fn name(self) -> &'static str {
        match self {
            Register::PresentPosition => "Present_Position",
            Register::GoalPosition => "Goal_Position",
            Register::GoalSpeed => "Goal_Speed",
            Register::Acceleration => "Acceleration",
            Register::TorqueEnable => "Torque_Enable",
        }
    }

    /// 是否为只读寄存器
    pub const fn is_read_only(self) -> bool {
        matches!(self, Register::PresentPosition)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Register {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Register::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| ProtocolError::UnknownRegister(s.to_string()))
    }
}

/// 寄存器写入值
///
/// - `Scalar`: 广播到所有舵机（如 `Acceleration = 30`）
/// - `PerJoint`: 每个舵机一个值（如 `Goal_Position`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterValue {
    Scalar(i32),
    PerJoint(JointVector),
}

impl RegisterValue {
    /// 展开为每个舵机的值
    pub fn expand(&self, joint_count: usize) -> Result<JointVector, ProtocolError> {
        match self {
            RegisterValue::Scalar(v) => Ok(JointVector::splat(*v, joint_count)),
            RegisterValue::PerJoint(values) => {
                if values.len() != joint_count {
                    return Err(ProtocolError::JointCountMismatch {
                        expected: joint_count,
                        actual: values.len(),
                    });
                }
                Ok(values.clone())
            },
        }
    }
}

impl From<i32> for RegisterValue {
    fn from(value: i32) -> Self {
        RegisterValue::Scalar(value)
    }
}

impl From<JointVector> for RegisterValue {
    fn from(value: JointVector) -> Self {
        RegisterValue::PerJoint(value)
    }
}
