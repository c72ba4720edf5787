//! 示教台门面
//!
//! [`TeachingRig`] 持有主臂和从臂总线，通过 [`ModeController`] 保证
//! 录制、镜像、回放三者互斥。工作线程运行期间前台不触碰总线寄存器。
//!
//! 单臂配置下主臂与从臂是同一条总线：镜像不可用，
//! "边镜像边录制" 会被自动关闭。

use crate::error::DriverError;
use crate::mirroring::{MirrorConfig, MirrorStats, MirroringEngine};
use crate::mode::Mode;
use crate::playback::{PlaybackConfig, PlaybackEngine, PlaybackReport, SpeedFactor};
use crate::recording::{RecorderConfig, Recording, RecordingEngine};
use crate::session::{DEFAULT_STOP_TIMEOUT, ModeController, SessionHandle};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use teach_bus::ServoBus;
use teach_protocol::JointVector;
use tracing::{info, warn};

/// 工作线程与前台共享的总线句柄
pub type SharedBus<B> = Arc<Mutex<B>>;

/// 机械臂角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arm {
    /// 操作员手动拖动的主臂
    Master,
    /// 镜像 / 回放的从臂
    Slave,
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arm::Master => write!(f, "master"),
            Arm::Slave => write!(f, "slave"),
        }
    }
}

/// 示教台运行配置（启动后不可变）
#[derive(Debug, Clone, PartialEq)]
pub struct RigConfig {
    pub recorder: RecorderConfig,
    pub mirror: MirrorConfig,
    pub playback: PlaybackConfig,
    pub stop_timeout: Duration,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            recorder: RecorderConfig::default(),
            mirror: MirrorConfig::default(),
            playback: PlaybackConfig::default(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

/// 主从示教台
pub struct TeachingRig<B: ServoBus + 'static> {
    master: SharedBus<B>,
    slave: SharedBus<B>,
    dual: bool,
    joint_count: usize,
    config: RigConfig,
    controller: ModeController,
}

impl<B: ServoBus + 'static> TeachingRig<B> {
    /// 由已连接的总线构造（通常通过 [`crate::RigBuilder`]）
    ///
    /// `slave` 为 `None` 时为单臂配置。
    pub(crate) fn from_buses(master: B, slave: Option<B>, config: RigConfig) -> Self {
        let joint_count = master.joint_count();
        let master = Arc::new(Mutex::new(master));
        let (slave, dual) = match slave {
            Some(slave) => (Arc::new(Mutex::new(slave)), true),
            None => (master.clone(), false),
        };

        Self {
            master,
            slave,
            dual,
            joint_count,
            controller: ModeController::new(config.stop_timeout),
            config,
        }
    }

    /// 当前模式
    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    /// 是否为主从双臂配置
    pub fn is_dual(&self) -> bool {
        self.dual
    }

    pub fn joint_count(&self) -> usize {
        self.joint_count
    }

    /// 按默认录制配置开始录制
    pub fn start_recording(&self) -> Result<SessionHandle<Recording>, DriverError> {
        self.start_recording_with(self.config.recorder.clone())
    }

    /// 按指定录制配置开始录制
    pub fn start_recording_with(
        &self,
        mut config: RecorderConfig,
    ) -> Result<SessionHandle<Recording>, DriverError> {
        if config.sample_interval.is_zero() {
            return Err(DriverError::InvalidParameter(
                "sample interval must be positive".to_string(),
            ));
        }
        if config.mirror_to_slave && !self.dual {
            warn!("Single-arm rig: recording without mirroring to slave");
            config.mirror_to_slave = false;
        }

        let slave = config.mirror_to_slave.then(|| self.slave.clone());
        let engine = RecordingEngine::new(config, self.master.clone(), slave);
        self.controller
            .request(Mode::Recording, move |cancel| engine.run(&cancel))
    }

    /// 开始镜像（仅双臂）
    pub fn start_mirroring(&self) -> Result<SessionHandle<MirrorStats>, DriverError> {
        if !self.dual {
            return Err(DriverError::InvalidParameter(
                "mirroring requires both master and slave arms".to_string(),
            ));
        }
        if self.config.mirror.fps == 0 {
            return Err(DriverError::InvalidParameter(
                "mirror fps must be positive".to_string(),
            ));
        }

        let engine =
            MirroringEngine::new(self.config.mirror.clone(), self.master.clone(), self.slave.clone());
        self.controller
            .request(Mode::Mirroring, move |cancel| engine.run(&cancel))
    }

    /// 在从臂上回放采样点序列
    ///
    /// `speed` 超出 [0.5, 2.0] 时被截断。少于 2 个采样点时工作线程立即结束。
    pub fn play(
        &self,
        waypoints: Vec<JointVector>,
        speed: f64,
    ) -> Result<SessionHandle<PlaybackReport>, DriverError> {
        let speed = SpeedFactor::clamped(speed)?;
        PlaybackEngine::<B>::validate(&waypoints, self.joint_count)?;

        let engine = PlaybackEngine::new(self.config.playback.clone(), self.slave.clone());
        self.controller
            .request(Mode::Playing, move |cancel| engine.run(&waypoints, speed, &cancel))
    }

    /// 停止会话并取回结果
    pub fn stop<T>(&self, handle: SessionHandle<T>) -> Result<T, DriverError> {
        self.controller.stop(handle)
    }

    /// 等待会话自然结束（用于回放）
    pub fn wait<T>(&self, handle: SessionHandle<T>) -> Result<T, DriverError> {
        self.controller.wait(handle)
    }

    /// 设置两只机械臂的扭矩
    ///
    /// ⚠️ 关闭扭矩后机械臂会在重力作用下掉落。会话运行期间拒绝。
    pub fn set_torque(&self, enabled: bool) -> Result<(), DriverError> {
        self.ensure_idle()?;

        if !enabled {
            warn!("Disabling torque: support the arms before they go limp");
        }

        self.master.lock().set_torque(enabled)?;
        if self.dual {
            self.slave.lock().set_torque(enabled)?;
        }
        info!("Torque {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// 读取指定机械臂的当前位置（会话运行期间拒绝）
    pub fn read_positions(&self, arm: Arm) -> Result<JointVector, DriverError> {
        self.ensure_idle()?;
        let bus = match arm {
            Arm::Master => &self.master,
            Arm::Slave => &self.slave,
        };
        let positions = bus.lock().read_positions()?;
        Ok(positions)
    }

    /// 停止活动会话并断开总线
    pub fn shutdown(&self) -> Result<(), DriverError> {
        if let Some(mode) = self.controller.cancel_active() {
            info!("Shutting down: stopping active {} session", mode);
            if !self.controller.wait_idle(self.config.stop_timeout) {
                warn!("{} worker still running at shutdown", mode);
            }
        }

        self.master.lock().disconnect()?;
        if self.dual {
            self.slave.lock().disconnect()?;
        }
        info!("Rig disconnected");
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), DriverError> {
        match self.controller.mode() {
            Mode::Idle => Ok(()),
            active => Err(DriverError::Busy { active }),
        }
    }
}

impl<B: ServoBus + 'static> Drop for TeachingRig<B> {
    fn drop(&mut self) {
        self.controller.cancel_active();

        // 工作线程可能仍持有锁，不阻塞
        let slave = self.dual.then_some(&self.slave);
        for bus in std::iter::once(&self.master).chain(slave) {
            if let Some(mut bus) = bus.try_lock()
                && let Err(e) = bus.disconnect()
            {
                warn!("Failed to disconnect bus on drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teach_bus::mock::MockBus;
    use teach_protocol::Register;

    fn dual_rig() -> (TeachingRig<MockBus>, MockBus, MockBus) {
        let master = MockBus::new(2, 1000);
        let slave = MockBus::new(2, 2000);
        let rig = TeachingRig::from_buses(master.clone(), Some(slave.clone()), RigConfig::default());
        (rig, master, slave)
    }

    #[test]
    fn test_arm_display() {
        assert_eq!(Arm::Master.to_string(), "master");
        assert_eq!(Arm::Slave.to_string(), "slave");
    }

    #[test]
    fn test_single_arm_rejects_mirroring() {
        let rig = TeachingRig::from_buses(MockBus::new(3, 0), None, RigConfig::default());
        assert!(!rig.is_dual());
        assert!(matches!(
            rig.start_mirroring(),
            Err(DriverError::InvalidParameter(_))
        ));
        assert_eq!(rig.mode(), Mode::Idle);
    }

    #[test]
    fn test_torque_rejected_while_busy() {
        let (rig, master, slave) = dual_rig();
        rig.set_torque(false).unwrap();
        assert_eq!(master.register(Register::TorqueEnable), Some(JointVector::from([0, 0])));
        assert_eq!(slave.register(Register::TorqueEnable), Some(JointVector::from([0, 0])));

        let handle = rig.start_mirroring().unwrap();
        assert!(matches!(
            rig.set_torque(true),
            Err(DriverError::Busy {
                active: Mode::Mirroring
            })
        ));
        assert!(matches!(rig.read_positions(Arm::Master), Err(DriverError::Busy { .. })));
        std::thread::sleep(Duration::from_millis(100));
        rig.stop(handle).unwrap();

        assert_eq!(rig.read_positions(Arm::Slave).unwrap(), JointVector::from([1000, 1000]));
    }

    #[test]
    fn test_play_rejects_wrong_joint_count() {
        let (rig, _, slave) = dual_rig();
        let err = rig
            .play(vec![JointVector::from([1, 2, 3]), JointVector::from([4, 5, 6])], 1.0)
            .unwrap_err();
        assert!(matches!(err, DriverError::InvalidParameter(_)));
        assert_eq!(rig.mode(), Mode::Idle);
        assert!(slave.writes().is_empty());
    }

    #[test]
    fn test_play_rejects_out_of_range_goals() {
        let (rig, _, slave) = dual_rig();
        let err = rig
            .play(vec![JointVector::from([100, 100]), JointVector::from([5000, 100])], 1.0)
            .unwrap_err();
        assert!(matches!(err, DriverError::InvalidParameter(_)));
        assert_eq!(rig.mode(), Mode::Idle);
        assert!(slave.goal_positions().is_empty());
    }

    #[test]
    fn test_shutdown_disconnects() {
        let (rig, master, slave) = dual_rig();
        let mut m = master.clone();
        let mut s = slave.clone();
        m.connect().unwrap();
        s.connect().unwrap();

        let _handle = rig.start_mirroring().unwrap();
        rig.shutdown().unwrap();
        assert_eq!(rig.mode(), Mode::Idle);
        assert!(!master.is_connected());
        assert!(!slave.is_connected());
    }
}
