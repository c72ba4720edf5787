//! 镜像引擎集成测试
//!
//! 验证：
//! 1. 精确睡眠下循环频率接近目标 fps
//! 2. 总线 IO 慢于帧间隔时，频率不足被检测并计数
//! 3. 设备断开时镜像不退出，致命错误被计数，重新接上后恢复转发

use serial_test::serial;
use std::thread;
use std::time::{Duration, Instant};
use teach_bus::mock::MockBus;
use teach_sdk::prelude::*;

fn mirror_rig(fps: u32) -> (TeachingRig<MockBus>, MockBus, MockBus) {
    let master = MockBus::new(3, 2048).with_motion(|i| JointVector::splat(1500 + (i % 200) as i32, 3));
    let slave = MockBus::new(3, 2048);
    let config = RigConfig {
        mirror: MirrorConfig {
            fps,
            ..Default::default()
        },
        ..Default::default()
    };
    let rig = RigBuilder::new()
        .master(master.clone())
        .slave(slave.clone())
        .config(config)
        .build()
        .unwrap();
    (rig, master, slave)
}

fn mirror_for(rig: &TeachingRig<MockBus>, duration: Duration) -> MirrorStats {
    let session = rig.start_mirroring().unwrap();
    thread::sleep(duration);
    rig.stop(session).unwrap()
}

#[test]
#[serial]
fn test_mirroring_holds_target_rate() {
    let (rig, _master, slave) = mirror_rig(100);

    let stats = mirror_for(&rig, Duration::from_millis(1250));

    let hz = stats.achieved_hz.expect("one full rate window");
    assert!((hz - 100.0).abs() < 5.0, "achieved {:.1} Hz", hz);
    assert!(
        (105..=135).contains(&stats.frames),
        "{} frames in {:?}",
        stats.frames,
        stats.duration
    );
    assert_eq!(stats.read_errors + stats.write_errors, 0);
    assert_eq!(stats.fatal_errors, 0);
    assert_eq!(slave.goal_positions().len() as u64, stats.frames);
}

#[test]
#[serial]
fn test_slow_bus_reported_below_target() {
    let (rig, master, slave) = mirror_rig(100);
    // 读 + 写各 8ms，每帧至少 16ms（约 60 Hz）
    master.set_io_delay(Duration::from_millis(8));
    slave.set_io_delay(Duration::from_millis(8));

    let stats = mirror_for(&rig, Duration::from_millis(1300));

    let hz = stats.achieved_hz.expect("one full rate window");
    assert!(hz < 99.0, "achieved {:.1} Hz", hz);
    assert!(stats.slow_windows >= 1);
    assert_eq!(stats.fatal_errors, 0);
}

#[test]
#[serial]
fn test_unplugged_master_keeps_mirroring_alive() {
    let (rig, master, slave) = mirror_rig(100);

    let session = rig.start_mirroring().unwrap();
    thread::sleep(Duration::from_millis(100));
    master.unplug();
    thread::sleep(Duration::from_millis(100));

    // 循环仍在运行，只是没有新帧
    assert!(!session.is_finished());
    assert_eq!(rig.mode(), Mode::Mirroring);
    let frozen = slave.goal_positions().len();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(slave.goal_positions().len(), frozen);

    master.replug();
    thread::sleep(Duration::from_millis(100));
    assert!(slave.goal_positions().len() > frozen);

    let stats = rig.stop(session).unwrap();
    assert!(stats.fatal_errors >= 5, "{} fatal errors", stats.fatal_errors);
    assert_eq!(stats.read_errors, stats.fatal_errors);
    assert_eq!(stats.write_errors, 0);
    assert_eq!(rig.mode(), Mode::Idle);
}
