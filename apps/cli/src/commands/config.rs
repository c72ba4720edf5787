//! 配置管理命令

use crate::Paths;
use anyhow::{Context, Result};
use clap::Subcommand;
use teach_sdk::prelude::*;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效的配置（缺失文件时为默认值）
    Show,

    /// 校验配置文件
    Check,
}

impl ConfigCommand {
    pub fn execute(&self, paths: &Paths) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let config = TeachConfig::load_or_default(&paths.config);
                let layout = &config.layout;
                let master = layout.master();

                println!("配置文件: {}", paths.config.display());
                println!("  主臂: {} @ {} {:?}", master.port, master.baudrate, master.motor_ids);
                match layout.slave() {
                    Some(slave) => {
                        println!("  从臂: {} @ {} {:?}", slave.port, slave.baudrate, slave.motor_ids)
                    },
                    None => println!("  从臂: （单臂模式）"),
                }

                let rig = rig_config(&config);
                println!("  采样间隔: {:?}", rig.recorder.sample_interval);
                println!("  平滑窗口: {}", rig.recorder.smoothing_window);
                println!("  镜像频率: {} Hz", rig.mirror.fps);
                println!("  回放延迟: {:?}", rig.playback.base_delay);
                println!(
                    "  加速度 / 速度: {} / {}",
                    rig.playback.acceleration, rig.playback.base_speed
                );
                println!("  停止超时: {:?}", rig.stop_timeout);
                Ok(())
            },
            ConfigCommand::Check => {
                let config = TeachConfig::load_from_file(&paths.config)
                    .with_context(|| format!("Invalid config {}", paths.config.display()))?;
                println!(
                    "✅ {} 有效（{}，{} 个舵机）",
                    paths.config.display(),
                    if config.layout.is_dual() { "主从" } else { "单臂" },
                    config.joint_count()
                );
                Ok(())
            },
        }
    }
}
