//! # Teach Bus Layer
//!
//! 舵机总线抽象层。示教引擎只通过 [`ServoBus`] 访问硬件，
//! 串口枚举、握手和寄存器读写原语由具体后端实现。

use teach_protocol::{JointVector, ProtocolError, Register, RegisterValue, TORQUE_OFF, TORQUE_ON};
use thiserror::Error;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::MockBus;

/// 总线层统一错误类型
#[derive(Error, Debug)]
pub enum BusError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] BusDeviceError),
    #[error("Read timeout")]
    Timeout,
    #[error("Bus not connected")]
    NotConnected,
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl BusError {
    /// 是否为致命错误（重试无意义）
    pub fn is_fatal(&self) -> bool {
        match self {
            BusError::Device(e) => e.is_fatal(),
            BusError::NotConnected => true,
            _ => false,
        }
    }
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusDeviceErrorKind {
    Unknown,
    NotFound,
    NoDevice,
    AccessDenied,
    Busy,
    InvalidResponse,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct BusDeviceError {
    pub kind: BusDeviceErrorKind,
    pub message: String,
}

impl BusDeviceError {
    pub fn new(kind: BusDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            BusDeviceErrorKind::NoDevice
                | BusDeviceErrorKind::AccessDenied
                | BusDeviceErrorKind::NotFound
        )
    }
}

impl From<String> for BusDeviceError {
    fn from(message: String) -> Self {
        Self::new(BusDeviceErrorKind::Unknown, message)
    }
}

impl From<&str> for BusDeviceError {
    fn from(message: &str) -> Self {
        Self::new(BusDeviceErrorKind::Unknown, message)
    }
}

/// 舵机总线
///
/// 一条总线对应一只机械臂（主臂或从臂）。读写可能阻塞在串口 IO 上，
/// 调用方应只在后台工作线程中持有总线。
pub trait ServoBus: Send {
    fn connect(&mut self) -> Result<(), BusError> {
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BusError> {
        Ok(())
    }

    /// 总线上的舵机数量
    fn joint_count(&self) -> usize;

    /// 读取所有舵机的寄存器值
    fn read(&mut self, register: Register) -> Result<JointVector, BusError>;

    /// 写入寄存器（标量广播或逐舵机写入）
    fn write(&mut self, register: Register, value: RegisterValue) -> Result<(), BusError>;

    fn read_positions(&mut self) -> Result<JointVector, BusError> {
        self.read(Register::PresentPosition)
    }

    fn write_goal_positions(&mut self, positions: &JointVector) -> Result<(), BusError> {
        self.write(Register::GoalPosition, RegisterValue::PerJoint(positions.clone()))
    }

    fn set_torque(&mut self, enabled: bool) -> Result<(), BusError> {
        let value = if enabled { TORQUE_ON } else { TORQUE_OFF };
        self.write(Register::TorqueEnable, RegisterValue::Scalar(value))
    }
}

impl<B: ServoBus + ?Sized> ServoBus for Box<B> {
    fn connect(&mut self) -> Result<(), BusError> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<(), BusError> {
        (**self).disconnect()
    }

    fn joint_count(&self) -> usize {
        (**self).joint_count()
    }

    fn read(&mut self, register: Register) -> Result<JointVector, BusError> {
        (**self).read(register)
    }

    fn write(&mut self, register: Register, value: RegisterValue) -> Result<(), BusError> {
        (**self).write(register, value)
    }
}
