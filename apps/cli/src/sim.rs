//! 模拟示教台
//!
//! CLI 不直接访问串口，按配置中的布局构造 `MockBus`：
//! 主臂做正弦扫动并叠加少量读数抖动，从臂跟随写入的目标位置。

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use teach_sdk::bus::mock::MockBus;
use teach_sdk::prelude::*;
use tracing::info;

/// 扫动中心位置
const CENTER: f64 = 2048.0;

/// 扫动幅度
const AMPLITUDE: f64 = 600.0;

/// 一个完整扫动周期的读取次数
const PERIOD_READS: f64 = 400.0;

/// 读数抖动（±）
const JITTER: i32 = 3;

/// 主臂读数生成器
fn sweep(joint_count: usize, seed: u64) -> impl FnMut(u64) -> JointVector + Send + 'static {
    let mut rng = StdRng::seed_from_u64(seed);
    move |read_index| {
        let phase = read_index as f64 / PERIOD_READS * std::f64::consts::TAU;
        (0..joint_count)
            .map(|joint| {
                // 各关节错开相位
                let offset = joint as f64 * 0.5;
                let base = CENTER + AMPLITUDE * (phase + offset).sin();
                base.round_ties_even() as i32 + rng.gen_range(-JITTER..=JITTER)
            })
            .collect()
    }
}

/// 按配置构造模拟示教台
pub fn simulated_rig(config: &TeachConfig) -> Result<TeachingRig<MockBus>> {
    let layout = &config.layout;
    let joint_count = config.joint_count();

    let master = MockBus::new(joint_count, CENTER as i32).with_motion(sweep(joint_count, 0x7eac));
    let mut builder = RigBuilder::new().master(master).config(rig_config(config));

    if let Some(slave) = layout.slave() {
        builder = builder.slave(MockBus::new(slave.joint_count(), CENTER as i32));
    }

    let rig = builder.build().context("Failed to connect simulated rig")?;
    info!(
        "Simulated rig ready: master {} ({} joints){}",
        layout.master().port,
        joint_count,
        layout
            .slave()
            .map(|slave| format!(", slave {}", slave.port))
            .unwrap_or_default()
    );
    Ok(rig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_stays_near_center() {
        let mut motion = sweep(6, 1);
        for i in 0..1000 {
            let sample = motion(i);
            assert_eq!(sample.len(), 6);
            for &value in sample.iter() {
                assert!((CENTER as i32 - 610..=CENTER as i32 + 610).contains(&value));
            }
        }
    }

    #[test]
    fn test_single_layout_has_no_slave() {
        let rig = simulated_rig(&TeachConfig::default()).unwrap();
        assert!(!rig.is_dual());
        assert_eq!(rig.joint_count(), 6);
        rig.shutdown().unwrap();
    }
}
