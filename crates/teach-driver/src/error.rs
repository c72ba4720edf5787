//! 驱动层错误类型定义

use crate::mode::Mode;
use crate::rig::Arm;
use std::time::Duration;
use teach_bus::BusError;
use teach_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 总线读写错误
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// 协议错误（如关节数量不一致）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 已有会话在运行，请求被拒绝（状态不变）
    #[error("Rig busy: {active} session is active")]
    Busy { active: Mode },

    /// 工作线程未在超时内响应取消
    ///
    /// 非致命：状态已被强制复位为 Idle，但工作线程可能仍在完成最后一次 IO。
    #[error("{mode} worker did not stop within {waited:?}; mode forced to Idle")]
    StopTimeout { mode: Mode, waited: Duration },

    /// 参数无效（无副作用）
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// 启动时连接总线失败
    #[error("Failed to connect {arm} arm: {source}")]
    ConnectFailed {
        arm: Arm,
        #[source]
        source: BusError,
    },

    /// 工作线程 panic
    #[error("{0} worker panicked")]
    WorkerPanicked(Mode),

    /// 工作线程创建失败
    #[error("IO thread error: {0}")]
    IoThread(String),
}

impl DriverError {
    /// 是否只是警告（调用方可以继续）
    pub fn is_warning(&self) -> bool {
        matches!(self, DriverError::StopTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::Busy {
            active: Mode::Mirroring,
        };
        assert_eq!(err.to_string(), "Rig busy: Mirroring session is active");

        let err = DriverError::StopTimeout {
            mode: Mode::Recording,
            waited: Duration::from_secs(1),
        };
        assert!(err.to_string().contains("forced to Idle"));
        assert!(err.is_warning());

        let err = DriverError::InvalidParameter("slot 11".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: slot 11");
        assert!(!err.is_warning());
    }

    #[test]
    fn test_from_bus_error() {
        let err: DriverError = BusError::Timeout.into();
        match err {
            DriverError::Bus(e) => assert!(matches!(e, BusError::Timeout)),
            _ => panic!("Expected Bus variant"),
        }
    }

    #[test]
    fn test_connect_failed_source() {
        use std::error::Error;

        let err = DriverError::ConnectFailed {
            arm: Arm::Slave,
            source: BusError::NotConnected,
        };
        assert_eq!(err.to_string(), "Failed to connect slave arm: Bus not connected");
        assert!(err.source().is_some());
    }
}
