//! 录制命令
//!
//! 拖动主臂录制轨迹，可选保存到动作库槽位

use crate::Paths;
use crate::sim::simulated_rig;
use crate::utils::{self, WaitOutcome};
use anyhow::{Context, Result, bail};
use clap::Args;
use teach_sdk::prelude::*;
use tracing::warn;

/// 录制命令参数
#[derive(Args, Debug)]
pub struct RecordCommand {
    /// 保存到的槽位（1-10），不指定则只显示统计
    #[arg(short, long)]
    pub slot: Option<u8>,

    /// 动作名称（默认 Action_{slot}）
    #[arg(short, long)]
    pub name: Option<String>,

    /// 录制时长（秒），0 表示直到 Ctrl-C
    #[arg(short, long, default_value_t = 0.0)]
    pub duration: f64,

    /// 不裁剪首尾各 3 帧
    #[arg(long)]
    pub no_trim: bool,

    /// 录制时同步驱动从臂
    #[arg(short, long)]
    pub mirror: bool,

    /// 平滑窗口（覆盖配置，0 关闭）
    #[arg(long)]
    pub smoothing: Option<usize>,
}

impl RecordCommand {
    /// 根据参数调整录制配置
    fn recorder_config(&self, base: &RecorderConfig) -> RecorderConfig {
        let mut recorder = if self.mirror {
            RecorderConfig {
                slave_acceleration: base.slave_acceleration,
                slave_goal_speed: base.slave_goal_speed,
                ..RecorderConfig::mirrored(base.sample_interval)
            }
        } else {
            base.clone()
        };
        if let Some(window) = self.smoothing {
            recorder.smoothing_window = window;
        }
        recorder
    }

    /// 执行录制
    pub fn execute(&self, paths: &Paths) -> Result<()> {
        // 先校验槽位，避免录完才发现无法保存
        let slot = self.slot.map(Slot::new).transpose()?;

        let config = utils::load_config(&paths.config);
        let rig = simulated_rig(&config)?;
        let recorder = self.recorder_config(&rig.config().recorder);

        let stop = utils::stop_flag()?;
        let session = rig.start_recording_with(recorder)?;
        println!("🔴 录制中... 按 Ctrl-C 停止");

        let outcome = utils::wait_for_stop(&session, utils::duration_from_secs(self.duration), &stop);
        if outcome == WaitOutcome::Interrupted {
            println!("⏹  用户停止");
        }

        let mut recording = match rig.stop(session) {
            Ok(recording) => recording,
            Err(e) if e.is_warning() => {
                warn!("{}", e);
                rig.shutdown()?;
                bail!("Recording worker did not stop in time; nothing was saved");
            },
            Err(e) => return Err(e).context("Recording failed"),
        };

        if !self.no_trim {
            recording.trim(true, true);
        }

        println!(
            "✅ 录制完成: {} 帧, {:.2}s, 读取错误 {}",
            recording.len(),
            recording.duration().as_secs_f64(),
            recording.read_errors()
        );
        if recording.fatal_errors() > 0 {
            println!("⚠️  主臂致命总线错误 {} 次（设备断开？）", recording.fatal_errors());
        }
        rig.shutdown()?;

        let Some(slot) = slot else {
            return Ok(());
        };
        if recording.is_empty() {
            bail!("Recording is empty, nothing to save");
        }

        let mut library = utils::load_library(&paths.library)?;
        let action = library.save(slot.get(), recording.into_waypoints(), self.name.as_deref())?;
        println!("💾 已保存 {:?} 到槽位 {}", action.name, slot);
        library
            .save_to_file(&paths.library)
            .with_context(|| format!("Failed to write {}", paths.library.display()))?;

        Ok(())
    }
}
