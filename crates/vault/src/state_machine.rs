// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! The vault's only writer of task state: every move between workflow
//! folders goes through [`VaultStateMachine::transition`], which checks
//! the transition matrix, rewrites frontmatter into a tempfile on the
//! destination folder, fsyncs, and only then performs the rename that
//! actually changes the task's state. A crash at any point before that
//! rename leaves the task exactly where it was.

use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use warden_core::{AuditEvent, AuditLevel, AuditOutcome, Task, TraceId, VaultError, WorkflowFolder};
use warden_storage::AuditLog;

const RETRY_DELAYS_MS: [u64; 3] = [100, 200, 400];

/// Single-writer mover between the vault's workflow folders.
pub struct VaultStateMachine {
    root: PathBuf,
    audit: AuditLog,
}

impl VaultStateMachine {
    pub fn open(root: impl Into<PathBuf>, audit: AuditLog) -> Self {
        Self { root: root.into(), audit }
    }

    fn folder_path(&self, folder: WorkflowFolder, filename: &str) -> Result<PathBuf, VaultError> {
        let path = self.root.join(folder.dir_name()).join(filename);
        if path.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
            return Err(VaultError::ValidationError {
                reason: format!("filename '{filename}' escapes the vault root"),
            });
        }
        Ok(path)
    }

    fn emit(&self, task_id: &warden_core::TaskId, from: WorkflowFolder, to: WorkflowFolder, reason: &str, outcome: AuditOutcome) {
        let mut context = BTreeMap::new();
        context.insert("reason".to_string(), reason.to_string());
        context.insert("from".to_string(), from.dir_name().to_string());
        context.insert("to".to_string(), to.dir_name().to_string());
        let event = AuditEvent {
            ts: Utc::now(),
            trace_id: TraceId::new(),
            level: if outcome == AuditOutcome::Ok { AuditLevel::Info } else { AuditLevel::Error },
            event_type: "task.transitioned".to_string(),
            actor: "vault_state_machine".to_string(),
            task_id: Some(task_id.clone()),
            approval_id: None,
            driver: None,
            action_type: None,
            outcome,
            duration_ms: None,
            redacted_context: context,
        };
        if let Err(e) = self.audit.append(&event) {
            tracing::error!(error = %e, "failed to audit task transition; event is unlogged");
        }
    }

    /// Move `task` to `target`, validating the transition matrix first.
    /// Idempotent: if `target`'s copy already exists and the source copy
    /// is gone, this returns it without emitting a duplicate audit event.
    pub fn transition(&self, task: &Task, target: WorkflowFolder, reason: &str, actor: &str) -> Result<Task, VaultError> {
        if !task.state.can_transition_to(target) {
            return Err(VaultError::InvalidTransition {
                from: task.state.dir_name().to_string(),
                to: target.dir_name().to_string(),
            });
        }

        let filename = task.filename();
        let source_path = self.folder_path(task.state, &filename)?;
        let dest_path = self.folder_path(target, &filename)?;

        if !source_path.exists() && dest_path.exists() {
            let contents = fs::read_to_string(&dest_path).map_err(|e| fs_err(&dest_path, e))?;
            let (existing, _body) = Task::parse_document(&contents)?;
            return Ok(existing);
        }

        let mut updated = task.clone();
        updated.state = target;

        let mut last_err = None;
        for (attempt, delay_ms) in RETRY_DELAYS_MS.iter().enumerate() {
            match self.attempt_move(task, &updated, &source_path, &dest_path) {
                Ok(()) => {
                    self.emit(&task.task_id, task.state, target, reason, AuditOutcome::Ok);
                    tracing::info!(task_id = %task.task_id, from = %task.state.dir_name(), to = %target.dir_name(), actor, "task transitioned");
                    return Ok(updated);
                }
                Err(e) => {
                    tracing::warn!(task_id = %task.task_id, attempt, error = %e, "transition attempt failed, retrying");
                    last_err = Some(e);
                    std::thread::sleep(Duration::from_millis(*delay_ms));
                }
            }
        }
        match self.attempt_move(task, &updated, &source_path, &dest_path) {
            Ok(()) => {
                self.emit(&task.task_id, task.state, target, reason, AuditOutcome::Ok);
                Ok(updated)
            }
            Err(e) => {
                self.emit(&task.task_id, task.state, target, reason, AuditOutcome::Err);
                Err(last_err.unwrap_or(e))
            }
        }
    }

    fn attempt_move(&self, task: &Task, updated: &Task, source_path: &Path, dest_path: &Path) -> Result<(), VaultError> {
        let contents = fs::read_to_string(source_path).map_err(|e| fs_err(source_path, e))?;
        let (_current, body) = Task::parse_document(&contents)?;
        let doc = updated.to_document(&body)?;

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).map_err(|e| fs_err(parent, e))?;
        }
        let tmp_path = dest_path.with_extension("md.tmp");
        let mut tmp = fs::File::create(&tmp_path).map_err(|e| fs_err(&tmp_path, e))?;
        use std::io::Write;
        tmp.write_all(doc.as_bytes()).map_err(|e| fs_err(&tmp_path, e))?;
        tmp.sync_all().map_err(|e| fs_err(&tmp_path, e))?;

        fs::rename(&tmp_path, dest_path).map_err(|e| fs_err(dest_path, e))?;
        if source_path != dest_path {
            if let Err(e) = fs::remove_file(source_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(task_id = %task.task_id, error = %e, "dest write succeeded but stale source file could not be removed");
                }
            }
        }
        Ok(())
    }
}

fn fs_err(path: impl AsRef<Path>, source: std::io::Error) -> VaultError {
    VaultError::FileSystemError { message: format!("{}: {source}", path.as_ref().display()) }
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
