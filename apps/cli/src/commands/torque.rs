//! 扭矩命令

use crate::Paths;
use crate::sim::simulated_rig;
use crate::utils;
use anyhow::Result;
use clap::{Args, ValueEnum};
use teach_sdk::prelude::*;

/// 扭矩状态
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorqueState {
    On,
    Off,
}

/// 扭矩命令参数
#[derive(Args, Debug)]
pub struct TorqueCommand {
    /// on：锁定；off：释放（可手动拖动）
    #[arg(value_enum)]
    pub state: TorqueState,
}

impl TorqueCommand {
    pub fn execute(&self, paths: &Paths) -> Result<()> {
        let config = utils::load_config(&paths.config);
        let rig = simulated_rig(&config)?;

        let enabled = self.state == TorqueState::On;
        rig.set_torque(enabled)?;
        println!("✅ 扭矩已{}", if enabled { "开启" } else { "关闭" });

        let position = rig.read_positions(Arm::Master)?;
        println!("   主臂位置: {}", position);

        rig.shutdown()?;
        Ok(())
    }
}
