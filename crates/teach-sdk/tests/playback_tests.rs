//! 回放引擎集成测试

use serial_test::serial;
use std::thread;
use std::time::{Duration, Instant};
use teach_bus::mock::MockBus;
use teach_sdk::driver::interpolation::step_count;
use teach_sdk::prelude::*;

fn rig_with_delay(base_delay: Duration) -> (TeachingRig<MockBus>, MockBus) {
    let master = MockBus::new(3, 2048);
    let slave = MockBus::new(3, 2048);
    let config = RigConfig {
        playback: PlaybackConfig {
            base_delay,
            ..Default::default()
        },
        ..Default::default()
    };
    let rig = RigBuilder::new()
        .master(master)
        .slave(slave.clone())
        .config(config)
        .build()
        .unwrap();
    (rig, slave)
}

#[test]
#[serial]
fn test_step_counts_follow_move_size() {
    let (rig, slave) = rig_with_delay(Duration::from_millis(1));
    let waypoints = vec![
        JointVector::from([1000, 1000, 1000]),
        JointVector::from([1050, 1000, 1000]), // 50 -> 3
        JointVector::from([1050, 1200, 1000]), // 200 -> 5
        JointVector::from([1050, 1200, 1600]), // 600 -> 7
    ];

    let report = rig.wait(rig.play(waypoints.clone(), 1.0).unwrap()).unwrap();
    assert_eq!(report.segments, 3);
    assert_eq!(report.frames_written, 3 + 5 + 7);
    assert_eq!(report.write_errors, 0);

    let goals = slave.goal_positions();
    assert_eq!(goals.len(), 15);
    assert_eq!(goals[0], waypoints[0]);
    assert_eq!(goals[2], waypoints[1]);
    assert_eq!(goals[3], waypoints[1]);
    assert_eq!(goals[7], waypoints[2]);
    assert_eq!(goals[14], waypoints[3]);

    // 5 步段的中点：t = 0.5 -> eased 0.5
    assert_eq!(goals[5], JointVector::from([1050, 1100, 1000]));
    assert_eq!(step_count(600), 7);
}

#[test]
#[serial]
fn test_speed_factor_is_clamped() {
    let (rig, slave) = rig_with_delay(Duration::from_millis(1));
    let waypoints = vec![JointVector::splat(0, 3), JointVector::splat(10, 3)];

    rig.wait(rig.play(waypoints.clone(), 5.0).unwrap()).unwrap();
    assert_eq!(slave.register(Register::GoalSpeed), Some(JointVector::splat(16000, 3)));

    rig.wait(rig.play(waypoints.clone(), 0.1).unwrap()).unwrap();
    assert_eq!(slave.register(Register::GoalSpeed), Some(JointVector::splat(4000, 3)));

    rig.wait(rig.play(waypoints, 1.0).unwrap()).unwrap();
    assert_eq!(slave.register(Register::GoalSpeed), Some(JointVector::splat(8000, 3)));
    assert_eq!(slave.register(Register::Acceleration), Some(JointVector::splat(30, 3)));

    assert!(matches!(
        rig.play(vec![JointVector::splat(0, 3); 2], f64::NAN),
        Err(DriverError::InvalidParameter(_))
    ));
}

#[test]
#[serial]
fn test_speed_scales_frame_delay() {
    let (rig, _slave) = rig_with_delay(Duration::from_millis(20));
    // 600 -> 7 帧
    let waypoints = vec![JointVector::splat(0, 3), JointVector::splat(600, 3)];

    let start = Instant::now();
    rig.wait(rig.play(waypoints.clone(), 2.0).unwrap()).unwrap();
    let fast = start.elapsed();

    let start = Instant::now();
    rig.wait(rig.play(waypoints, 0.5).unwrap()).unwrap();
    let slow = start.elapsed();

    // 7 × 10ms vs 7 × 40ms
    assert!(fast >= Duration::from_millis(70));
    assert!(slow >= Duration::from_millis(280));
    assert!(slow > fast * 2);
}

#[test]
#[serial]
fn test_short_actions_are_noops() {
    let (rig, slave) = rig_with_delay(Duration::from_millis(1));

    let report = rig.wait(rig.play(Vec::new(), 1.0).unwrap()).unwrap();
    assert_eq!(report, PlaybackReport::default());

    let report = rig.wait(rig.play(vec![JointVector::splat(5, 3)], 1.0).unwrap()).unwrap();
    assert_eq!(report.frames_written, 0);
    assert!(slave.writes().is_empty());
}

#[test]
#[serial]
fn test_write_errors_do_not_abort_playback() {
    let (rig, slave) = rig_with_delay(Duration::from_millis(1));
    // 两次寄存器设置 + 前两帧失败
    slave.fail_next_writes(4);
    let waypoints = vec![
        JointVector::splat(0, 3),
        JointVector::splat(10, 3),
        JointVector::splat(20, 3),
    ];

    let report = rig.wait(rig.play(waypoints, 1.0).unwrap()).unwrap();
    assert_eq!(report.write_errors, 2);
    assert_eq!(report.frames_written, 4);
    assert_eq!(report.segments, 2);
    assert_eq!(slave.present(), JointVector::splat(20, 3));
}

#[test]
#[serial]
fn test_stop_cancels_playback() {
    let (rig, slave) = rig_with_delay(Duration::from_millis(20));
    let waypoints: Vec<_> = (0..20).map(|i| JointVector::splat(i * 400 % 4000, 3)).collect();

    let session = rig.play(waypoints, 1.0).unwrap();
    thread::sleep(Duration::from_millis(100));
    let report = rig.stop(session).unwrap();

    assert!(report.cancelled);
    assert!(report.segments < 19);
    assert_eq!(slave.goal_positions().len(), report.frames_written);
    assert_eq!(rig.mode(), Mode::Idle);
}
