//! Builder 模式实现
//!
//! 提供链式构造 `TeachingRig` 实例的便捷方式。

use crate::error::DriverError;
use crate::rig::{Arm, RigConfig, TeachingRig};
use teach_bus::ServoBus;
use tracing::{info, warn};

/// TeachingRig Builder（链式构造）
///
/// `build()` 会依次连接主臂和从臂；任一连接失败都会中止启动。
///
/// # Example
///
/// ```rust
/// use teach_bus::mock::MockBus;
/// use teach_driver::{Mode, RigBuilder};
///
/// let rig = RigBuilder::new()
///     .master(MockBus::new(6, 2048))
///     .slave(MockBus::new(6, 2048))
///     .build()
///     .unwrap();
///
/// assert!(rig.is_dual());
/// assert_eq!(rig.mode(), Mode::Idle);
/// ```
pub struct RigBuilder<B: ServoBus> {
    master: Option<B>,
    slave: Option<B>,
    config: RigConfig,
}

impl<B: ServoBus + 'static> RigBuilder<B> {
    pub fn new() -> Self {
        Self {
            master: None,
            slave: None,
            config: RigConfig::default(),
        }
    }

    /// 设置主臂总线（必需）
    pub fn master(mut self, bus: B) -> Self {
        self.master = Some(bus);
        self
    }

    /// 设置从臂总线（可选，缺省为单臂配置）
    pub fn slave(mut self, bus: B) -> Self {
        self.slave = Some(bus);
        self
    }

    /// 设置运行配置（可选，默认 [`RigConfig::default`]）
    pub fn config(mut self, config: RigConfig) -> Self {
        self.config = config;
        self
    }

    /// 连接总线并构建示教台
    ///
    /// # 错误
    ///
    /// - `InvalidParameter`: 未设置主臂，或主从舵机数量不一致
    /// - `ConnectFailed`: 任一总线连接失败（已连接的总线会被断开）
    pub fn build(self) -> Result<TeachingRig<B>, DriverError> {
        let Some(mut master) = self.master else {
            return Err(DriverError::InvalidParameter(
                "master bus is required".to_string(),
            ));
        };

        if let Some(slave) = &self.slave
            && slave.joint_count() != master.joint_count()
        {
            return Err(DriverError::InvalidParameter(format!(
                "master has {} joints but slave has {}",
                master.joint_count(),
                slave.joint_count()
            )));
        }

        master.connect().map_err(|source| DriverError::ConnectFailed {
            arm: Arm::Master,
            source,
        })?;

        let slave = match self.slave {
            Some(mut slave) => {
                if let Err(source) = slave.connect() {
                    if let Err(e) = master.disconnect() {
                        warn!("Failed to disconnect master after slave connect error: {}", e);
                    }
                    return Err(DriverError::ConnectFailed {
                        arm: Arm::Slave,
                        source,
                    });
                }
                Some(slave)
            },
            None => None,
        };

        info!(
            "Teaching rig connected ({} arm, {} joints)",
            if slave.is_some() { "dual" } else { "single" },
            master.joint_count()
        );

        Ok(TeachingRig::from_buses(master, slave, self.config))
    }
}

impl<B: ServoBus + 'static> Default for RigBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}
