// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Bounded-backoff bookkeeping for a failed task: classifies the error,
//! updates retry frontmatter, and parks the task in whichever folder the
//! transition matrix allows before handing it back to the vault. A later
//! scheduler tick releases it from parking once its backoff has elapsed.

use chrono::{DateTime, Utc};
use std::time::Duration;
use warden_core::{AuditEvent, AuditLevel, AuditOutcome, ErrorClass, Task, TraceId, VaultError, WorkflowFolder};
use warden_storage::{AuditLog, Checkpointer};
use warden_vault::VaultStateMachine;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delays: Vec<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delays: [60, 300, 900, 3600, 14_400].into_iter().map(Duration::from_secs).collect(),
        }
    }
}

/// Parks a failed task with retry bookkeeping, or sends it to a terminal
/// folder once its error is permanent or its attempts are exhausted.
pub struct PersistenceRetryLoop {
    vault: VaultStateMachine,
    checkpointer: Checkpointer,
    audit: AuditLog,
    config: RetryConfig,
}

impl PersistenceRetryLoop {
    pub fn new(vault: VaultStateMachine, checkpointer: Checkpointer, audit: AuditLog, config: RetryConfig) -> Self {
        Self { vault, checkpointer, audit, config }
    }

    /// Record a failed attempt and transition the task accordingly. Returns
    /// the updated task in whichever folder it now lives.
    pub fn handle_failure(
        &self,
        task: &Task,
        error: &VaultError,
        now: DateTime<Utc>,
        actor: &str,
    ) -> Result<Task, VaultError> {
        let exhausted = error.classify() == ErrorClass::Permanent || task.retry_count + 1 > self.config.max_attempts;

        let mut parked = task.clone();
        parked.last_error = Some(format!("{}: {error}", error.label()));

        let (target, reason) = if exhausted {
            parked.next_retry_at = None;
            (self.exhausted_folder(task.state), format!("exhausted after {} attempts: {}", task.retry_count, error.label()))
        } else {
            parked.retry_count = task.retry_count + 1;
            let delay = self.delay_for(parked.retry_count);
            parked.next_retry_at = Some(now + chrono_duration(delay));
            (
                self.retry_folder(task.state),
                format!("attempt {}/{} failed: {}", parked.retry_count, self.config.max_attempts, error.label()),
            )
        };

        let updated = self.vault.transition(&parked, target, &reason, actor)?;

        if exhausted {
            self.emit_exhaustion(&updated, error);
        }
        self.checkpoint_after(&updated, exhausted)?;
        Ok(updated)
    }

    /// Whether a parked task's backoff has elapsed and it is eligible to
    /// be released back into `Needs_Action/`.
    pub fn is_ready(&self, task: &Task, now: DateTime<Utc>) -> bool {
        task.state == WorkflowFolder::ErrorQueue && task.next_retry_at.is_none_or(|due| now >= due)
    }

    /// Release a parked task whose backoff has elapsed. Returns `None` if
    /// it isn't due yet.
    pub fn release_if_ready(&self, task: &Task, now: DateTime<Utc>, actor: &str) -> Result<Option<Task>, VaultError> {
        if !self.is_ready(task, now) {
            return Ok(None);
        }
        let updated = self.vault.transition(task, WorkflowFolder::NeedsAction, "retry delay elapsed", actor)?;
        Ok(Some(updated))
    }

    fn delay_for(&self, retry_count: u32) -> Duration {
        self.config
            .delays
            .get((retry_count.saturating_sub(1)) as usize)
            .copied()
            .or_else(|| self.config.delays.last().copied())
            .unwrap_or(Duration::from_secs(14_400))
    }

    /// Where a failed task parks while its retry delay elapses: the matrix
    /// only wires `Approved -> Error_Queue`, so work that fails earlier
    /// (still in `Plans`, or bounced back from human review) is simply
    /// re-queued into `Needs_Action` directly rather than parked.
    fn retry_folder(&self, current: WorkflowFolder) -> WorkflowFolder {
        if current.can_transition_to(WorkflowFolder::ErrorQueue) {
            WorkflowFolder::ErrorQueue
        } else {
            WorkflowFolder::NeedsAction
        }
    }

    /// Where a task goes once it can no longer be retried: `Failed` where
    /// the matrix allows it (only reachable from `Error_Queue`), else
    /// `Rejected` for a human to triage.
    fn exhausted_folder(&self, current: WorkflowFolder) -> WorkflowFolder {
        let parked_in = self.retry_folder(current);
        if parked_in.can_transition_to(WorkflowFolder::Failed) {
            WorkflowFolder::Failed
        } else {
            WorkflowFolder::Rejected
        }
    }

    fn emit_exhaustion(&self, task: &Task, error: &VaultError) {
        let mut context = std::collections::BTreeMap::new();
        context.insert("error".to_string(), error.label().to_string());
        context.insert("retry_count".to_string(), task.retry_count.to_string());
        let event = AuditEvent {
            ts: Utc::now(),
            trace_id: TraceId::new(),
            level: AuditLevel::Critical,
            event_type: "task.exhausted".to_string(),
            actor: "persistence_retry_loop".to_string(),
            task_id: Some(task.task_id),
            approval_id: None,
            driver: None,
            action_type: None,
            outcome: AuditOutcome::Err,
            duration_ms: None,
            redacted_context: context,
        };
        if let Err(e) = self.audit.append(&event) {
            tracing::error!(error = %e, "failed to audit task exhaustion; event is unlogged");
        }
    }

    fn checkpoint_after(&self, task: &Task, exhausted: bool) -> Result<(), VaultError> {
        let mut checkpoint = self.checkpointer.load().map_err(Into::<VaultError>::into)?;
        checkpoint.last_poll = Utc::now();
        checkpoint.tasks_in_flight.remove(task.task_id.as_str());
        checkpoint.increment(if exhausted { "tasks_failed" } else { "retries" });
        self.checkpointer.save(&checkpoint).map_err(Into::<VaultError>::into)
    }
}

fn chrono_duration(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::seconds(14_400))
}

#[cfg(test)]
#[path = "retry_loop_tests.rs"]
mod tests;
