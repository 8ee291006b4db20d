// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;

#[test]
fn load_returns_default_when_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let checkpointer = Checkpointer::new(dir.path().join("checkpoint.json"));
    let checkpoint = checkpointer.load().unwrap();
    assert!(!checkpoint.stop_requested);
    assert!(checkpoint.tasks_in_flight.is_empty());
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let checkpointer = Checkpointer::new(dir.path().join("checkpoint.json"));

    let mut checkpoint = SchedulerCheckpoint::default();
    checkpoint.stop_requested = true;
    checkpoint.increment("tasks_discovered");
    checkpoint.tasks_in_flight.insert(
        "tsk-abc".to_string(),
        InFlightEntry {
            state: "plans".to_string(),
            attempts: 1,
            worker_id: "worker-0".to_string(),
            started_at: Utc::now(),
        },
    );
    checkpointer.save(&checkpoint).unwrap();

    let loaded = checkpointer.load().unwrap();
    assert!(loaded.stop_requested);
    assert_eq!(loaded.counters.get("tasks_discovered"), Some(&1));
    assert_eq!(loaded.tasks_in_flight.len(), 1);
}

#[test]
fn save_does_not_leave_a_stray_tempfile() {
    let dir = tempfile::tempdir().unwrap();
    let checkpointer = Checkpointer::new(dir.path().join("checkpoint.json"));
    checkpointer.save(&SchedulerCheckpoint::default()).unwrap();
    assert!(!dir.path().join("checkpoint.json.tmp").exists());
    assert!(dir.path().join("checkpoint.json").exists());
}
