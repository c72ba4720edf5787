//! 镜像命令

use crate::Paths;
use crate::sim::simulated_rig;
use crate::utils;
use anyhow::{Result, bail};
use clap::Args;
use tracing::warn;

/// 镜像命令参数
#[derive(Args, Debug)]
pub struct MirrorCommand {
    /// 镜像时长（秒），0 表示直到 Ctrl-C
    #[arg(short, long, default_value_t = 0.0)]
    pub duration: f64,
}

impl MirrorCommand {
    pub fn execute(&self, paths: &Paths) -> Result<()> {
        let config = utils::load_config(&paths.config);
        if !config.layout.is_dual() {
            bail!("Mirroring needs a dual-arm config (\"master\" and \"slave\")");
        }

        let rig = simulated_rig(&config)?;
        let stop = utils::stop_flag()?;
        let session = rig.start_mirroring()?;
        println!("🪞 镜像中 ({} Hz)... 按 Ctrl-C 停止", rig.config().mirror.fps);

        utils::wait_for_stop(&session, utils::duration_from_secs(self.duration), &stop);

        match rig.stop(session) {
            Ok(stats) => {
                println!(
                    "✅ 镜像结束: {} 帧, {:.2}s, 读取错误 {}, 写入错误 {}",
                    stats.frames,
                    stats.duration.as_secs_f64(),
                    stats.read_errors,
                    stats.write_errors
                );
                if let Some(hz) = stats.achieved_hz {
                    println!("   实际频率 {:.1} Hz (低于目标的统计窗口 {})", hz, stats.slow_windows);
                }
                if stats.fatal_errors > 0 {
                    println!("⚠️  致命总线错误 {} 次（设备断开？）", stats.fatal_errors);
                }
            },
            Err(e) if e.is_warning() => warn!("{}", e),
            Err(e) => return Err(e.into()),
        }

        rig.shutdown()?;
        Ok(())
    }
}
