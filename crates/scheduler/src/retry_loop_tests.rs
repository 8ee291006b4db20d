// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;
use warden_core::WorkflowFolder;

struct Fixture {
    dir: tempfile::TempDir,
    retry: PersistenceRetryLoop,
}

fn fixture(config: RetryConfig) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let audit = AuditLog::open(dir.path().join("Logs")).unwrap();
    let vault = VaultStateMachine::open(dir.path(), AuditLog::open(dir.path().join("Logs")).unwrap());
    let checkpointer = Checkpointer::new(dir.path().join("checkpoint.json"));
    Fixture { dir, retry: PersistenceRetryLoop::new(vault, checkpointer, audit, config) }
}

fn write_task(fx: &Fixture, task: &Task) {
    let folder_dir = fx.dir.path().join(task.state.dir_name());
    std::fs::create_dir_all(&folder_dir).unwrap();
    std::fs::write(folder_dir.join(task.filename()), task.to_document("body").unwrap()).unwrap();
}

#[test]
fn a_retryable_failure_parks_in_error_queue_from_approved() {
    let fx = fixture(RetryConfig::default());
    let task = Task::builder().state(WorkflowFolder::Approved).subject("wire a vendor payment").build();
    write_task(&fx, &task);

    let error = VaultError::Throttled { driver: "mail-sender".into(), action_type: "message".into() };
    let updated = fx.retry.handle_failure(&task, &error, Utc::now(), "scheduler").unwrap();

    assert_eq!(updated.state, WorkflowFolder::ErrorQueue);
    assert_eq!(updated.retry_count, 1);
    assert!(updated.next_retry_at.is_some());
    assert!(updated.last_error.as_deref().unwrap().contains("throttled"));
}

#[test]
fn a_retryable_failure_in_plans_requeues_to_needs_action() {
    let fx = fixture(RetryConfig::default());
    let task = Task::builder().state(WorkflowFolder::Plans).subject("draft a reply").build();
    write_task(&fx, &task);

    let error = VaultError::ReasoningCrashed { detail: "oom".into() };
    let updated = fx.retry.handle_failure(&task, &error, Utc::now(), "scheduler").unwrap();

    assert_eq!(updated.state, WorkflowFolder::NeedsAction);
    assert_eq!(updated.retry_count, 1);
}

#[test]
fn a_permanent_error_skips_retry_and_goes_straight_to_a_terminal_folder() {
    let fx = fixture(RetryConfig::default());
    let task = Task::builder().state(WorkflowFolder::Approved).subject("delete the staging bucket").build();
    write_task(&fx, &task);

    let error = VaultError::VerificationError { driver: "s3-cleaner".into(), reason: "untrusted binary".into() };
    let updated = fx.retry.handle_failure(&task, &error, Utc::now(), "scheduler").unwrap();

    assert_eq!(updated.state, WorkflowFolder::Failed);
    assert!(updated.next_retry_at.is_none());
}

#[test]
fn exhausting_max_attempts_transitions_to_failed_even_for_a_retryable_error() {
    let fx = fixture(RetryConfig { max_attempts: 2, delays: vec![Duration::from_secs(1), Duration::from_secs(2)] });
    let mut task = Task::builder().state(WorkflowFolder::Approved).subject("send the invoice").build();
    task.retry_count = 2;
    write_task(&fx, &task);

    let error = VaultError::DriverFailure { driver: "mail-sender".into(), message: "smtp down".into(), retryable: true };
    let updated = fx.retry.handle_failure(&task, &error, Utc::now(), "scheduler").unwrap();

    assert_eq!(updated.state, WorkflowFolder::Failed);
}

#[test]
fn release_if_ready_requeues_only_once_the_backoff_has_elapsed() {
    let fx = fixture(RetryConfig::default());
    let now = Utc::now();
    let mut task = Task::builder().state(WorkflowFolder::ErrorQueue).subject("retry the webhook").build();
    task.retry_count = 1;
    task.next_retry_at = Some(now + chrono::Duration::seconds(60));
    write_task(&fx, &task);

    assert!(fx.retry.release_if_ready(&task, now, "scheduler").unwrap().is_none());

    let later = now + chrono::Duration::seconds(61);
    let released = fx.retry.release_if_ready(&task, later, "scheduler").unwrap().unwrap();
    assert_eq!(released.state, WorkflowFolder::NeedsAction);
}
