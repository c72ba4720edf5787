//! 动作库集成测试：录制 → 保存 → 加载 → 回放

use serial_test::serial;
use std::fs;
use std::thread;
use std::time::Duration;
use teach_bus::mock::MockBus;
use teach_sdk::prelude::*;
use teach_sdk::tools::MalformedRecord;

#[test]
fn test_slot_three_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_LIBRARY_FILE);

    let mut library = ActionLibrary::new();
    let positions = vec![JointVector::from([1, 2, 3]), JointVector::from([4, 5, 6])];
    library.save(3, positions.clone(), None).unwrap();
    library.save_to_file(&path).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["3"]["positions"], serde_json::json!([[1, 2, 3], [4, 5, 6]]));
    assert_eq!(raw["3"]["name"], "Action_3");
    assert!(raw["3"]["timestamp"].as_str().is_some_and(|ts| ts.len() == 19));

    let report = ActionLibrary::load_from_file(&path).unwrap();
    assert!(report.is_clean());
    let loaded = report.into_library();
    let slot = Slot::new(3).unwrap();
    assert_eq!(loaded.slots(), vec![slot]);
    assert_eq!(loaded.get(slot).unwrap().positions, positions);
}

#[test]
fn test_corrupt_entry_does_not_lose_library() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("actions.json");
    fs::write(
        &path,
        r#"{
            "1": {"positions": [[100, 200], [110, 210]], "name": "reach", "timestamp": "2024-05-27 10:00:00"},
            "2": {"name": "broken"},
            "9": {"positions": [[300, 400]]}
        }"#,
    )
    .unwrap();

    let report = ActionLibrary::load_from_file(&path).unwrap();
    assert_eq!(
        report.rejected,
        vec![MalformedRecord {
            key: "2".to_string(),
            reason: "missing \"positions\"".to_string(),
        }]
    );

    let library = report.into_library();
    assert_eq!(library.len(), 2);
    assert_eq!(library.get(Slot::new(1).unwrap()).unwrap().name, "reach");
    assert_eq!(library.get(Slot::new(9).unwrap()).unwrap().name, "Action_9");
}

#[test]
fn test_unreadable_library_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("actions.json");
    fs::write(&path, "not json").unwrap();
    assert!(matches!(
        ActionLibrary::load_from_file(&path),
        Err(LibraryError::Json(_))
    ));
}

#[test]
#[serial]
fn test_record_save_load_replay() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_LIBRARY_FILE);

    let master = MockBus::new(2, 0);
    master.push_positions((0..20).map(|i| JointVector::from([2000 + i * 20, 1000])));
    let slave = MockBus::new(2, 0);
    let config = RigConfig {
        recorder: RecorderConfig {
            sample_interval: Duration::from_millis(1),
            ..Default::default()
        },
        playback: PlaybackConfig {
            base_delay: Duration::from_millis(1),
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

    let session = rig.start_recording().unwrap();
    thread::sleep(Duration::from_millis(150));
    let mut recording = rig.stop(session).unwrap();
    recording.trim(true, true);

    let mut library = ActionLibrary::new();
    library
        .save(1, recording.into_waypoints(), Some("sweep"))
        .unwrap();
    library.save_to_file(&path).unwrap();

    let loaded = ActionLibrary::load_from_file(&path).unwrap().into_library();
    let action = loaded.get(Slot::new(1).unwrap()).unwrap().clone();
    assert_eq!(action.name, "sweep");

    let report = rig.wait(rig.play(action.positions.clone(), 1.0).unwrap()).unwrap();
    assert!(report.frames_written >= action.len());
    assert_eq!(slave.present(), *action.positions.last().unwrap());
}
