//! `TeachConfig` → `RigConfig` 转换

use teach_driver::{MirrorConfig, PlaybackConfig, RecorderConfig, RigConfig};
use teach_tools::TeachConfig;

/// 由磁盘配置生成驱动运行配置
///
/// 单臂布局下 `mirror_while_recording` 会在启动录制时被忽略。
pub fn rig_config(config: &TeachConfig) -> RigConfig {
    let engine = &config.engine;

    RigConfig {
        recorder: RecorderConfig {
            sample_interval: config.sample_interval(),
            smoothing_window: engine.smoothing_window,
            mirror_to_slave: engine.mirror_while_recording && config.layout.is_dual(),
            slave_acceleration: engine.acceleration,
            slave_goal_speed: engine.base_speed,
            ..RecorderConfig::default()
        },
        mirror: MirrorConfig {
            fps: engine.mirror_fps,
            ..MirrorConfig::default()
        },
        playback: PlaybackConfig {
            base_delay: config.playback_base_delay(),
            acceleration: engine.acceleration,
            base_speed: engine.base_speed,
        },
        stop_timeout: config.stop_timeout(),
    }
}
