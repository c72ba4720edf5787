//! 回放命令
//!
//! 在从臂上以缓动插值回放动作库中的动作

use crate::Paths;
use crate::sim::simulated_rig;
use crate::utils::{self, WaitOutcome};
use anyhow::{Context, Result, bail};
use clap::Args;
use teach_sdk::prelude::*;
use tracing::warn;

/// 回放命令参数
#[derive(Args, Debug)]
pub struct PlayCommand {
    /// 槽位（1-10）
    #[arg(short, long)]
    pub slot: u8,

    /// 速度倍率（0.5 - 2.0）
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,
}

impl PlayCommand {
    pub fn execute(&self, paths: &Paths) -> Result<()> {
        let slot = Slot::new(self.slot)?;
        let library = utils::load_library(&paths.library)?;
        let Some(action) = library.get(slot) else {
            bail!("Slot {} is empty", slot);
        };

        let config = utils::load_config(&paths.config);
        let rig = simulated_rig(&config)?;

        println!(
            "▶️  回放 {:?} ({} 个路点, {}x)",
            action.name,
            action.len(),
            self.speed
        );
        let stop = utils::stop_flag()?;
        let session = rig.play(action.positions.clone(), self.speed)?;

        let result = match utils::wait_for_stop(&session, None, &stop) {
            WaitOutcome::Interrupted => rig.stop(session),
            _ => rig.wait(session),
        };

        match result {
            Ok(report) => {
                let status = if report.cancelled { "⏹  已取消" } else { "✅ 完成" };
                println!(
                    "{}: {} 段, {} 帧, 写入错误 {}",
                    status, report.segments, report.frames_written, report.write_errors
                );
            },
            Err(e) if e.is_warning() => warn!("{}", e),
            Err(e) => return Err(e).context("Playback failed"),
        }

        rig.shutdown()?;
        Ok(())
    }
}
