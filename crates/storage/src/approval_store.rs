// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! File-backed approval store: one markdown-with-frontmatter file per
//! approval under `Approvals/`, mutated only through `create`, `approve`,
//! `reject`, and `expire`.

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use warden_core::audit::ApprovalId;
use warden_core::approval::{ActionType, Approval, ApprovalStatus, RiskLevel};
use warden_core::task::TaskId;
use warden_core::VaultError;

/// Match an approver against one `authorized_approvers` glob pattern.
/// `*` matches any run of characters; every other character is literal.
/// An exact match short-circuits the regex build, since that is the
/// common case (a named approver rather than a wildcard domain).
fn glob_match(pattern: &str, approver: &str) -> bool {
    if pattern == approver {
        return true;
    }
    let anchored = format!("^{}$", pattern.split('*').map(regex::escape).collect::<Vec<_>>().join(".*"));
    regex::Regex::new(&anchored).map(|re| re.is_match(approver)).unwrap_or(false)
}

/// Compute the canonical content digest over an action payload: SHA-256
/// of its serialized-with-sorted-keys JSON bytes.
pub fn content_digest(payload: &serde_json::Value) -> String {
    let canonical = serde_json::to_vec(payload).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    format!("{:x}", hasher.finalize())
}

/// Single-mutator store for approval files.
pub struct ApprovalStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl ApprovalStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
        Ok(Self { root, write_lock: Mutex::new(()) })
    }

    fn path_for(&self, approval_id: &ApprovalId) -> PathBuf {
        self.root.join(format!("{approval_id}.md"))
    }

    fn write(&self, approval: &Approval) -> Result<(), StorageError> {
        let path = self.path_for(&approval.approval_id);
        let frontmatter = serde_yaml::to_string(approval)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let contents = format!("---\n{}---\n", frontmatter);
        let tmp_path = path.with_extension("md.tmp");
        fs::write(&tmp_path, &contents).map_err(|e| io_err(&tmp_path, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| io_err(&path, e))?;
        Ok(())
    }

    pub fn load(&self, approval_id: &ApprovalId) -> Result<Approval, StorageError> {
        let path = self.path_for(approval_id);
        let contents = fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let rest = contents.strip_prefix("---\n").ok_or_else(|| {
            StorageError::Serialization("approval file missing frontmatter delimiter".into())
        })?;
        let end = rest.find("\n---").ok_or_else(|| {
            StorageError::Serialization("approval file missing closing delimiter".into())
        })?;
        serde_yaml::from_str(&rest[..end]).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Create a new pending approval with a fresh nonce and content digest.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        task_id: TaskId,
        action_type: ActionType,
        risk_level: RiskLevel,
        payload: serde_json::Value,
        ttl: Option<chrono::Duration>,
        now: DateTime<Utc>,
    ) -> Result<Approval, StorageError> {
        let _guard = self.write_lock.lock();
        let ttl = ttl.unwrap_or_else(|| action_type.default_ttl());
        let digest = content_digest(&payload);
        let approval = Approval {
            approval_id: ApprovalId::new(),
            task_id,
            action_type,
            risk_level,
            status: ApprovalStatus::Pending,
            nonce: warden_core::Nonce::new(),
            content_digest: digest,
            created_at: now,
            expires_at: now + ttl,
            approver: None,
            decision_at: None,
            rejection_reason: None,
            action_payload: payload,
        };
        self.write(&approval)?;
        Ok(approval)
    }

    /// Approve a pending approval, verifying digest, authorized approver,
    /// status, and expiry. Any check failure returns `ApprovalInvalid`.
    /// `authorized_approvers` is the full per-action-type gate from
    /// `Config`; only the entry for this approval's own `action_type`
    /// applies, per §4.H.
    pub fn approve(
        &self,
        approval_id: &ApprovalId,
        approver: &str,
        authorized_approvers: &HashMap<ActionType, Vec<String>>,
        now: DateTime<Utc>,
    ) -> Result<Approval, VaultError> {
        let _guard = self.write_lock.lock();
        let mut approval = self.load(approval_id).map_err(Into::<VaultError>::into)?;
        self.validate_decision(&approval, approver, authorized_approvers, now)?;
        approval.status = ApprovalStatus::Approved;
        approval.approver = Some(approver.to_string());
        approval.decision_at = Some(now);
        self.write(&approval).map_err(Into::<VaultError>::into)?;
        Ok(approval)
    }

    /// Reject a pending approval.
    pub fn reject(
        &self,
        approval_id: &ApprovalId,
        approver: &str,
        authorized_approvers: &HashMap<ActionType, Vec<String>>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Approval, VaultError> {
        let _guard = self.write_lock.lock();
        let mut approval = self.load(approval_id).map_err(Into::<VaultError>::into)?;
        self.validate_decision(&approval, approver, authorized_approvers, now)?;
        approval.status = ApprovalStatus::Rejected;
        approval.approver = Some(approver.to_string());
        approval.decision_at = Some(now);
        approval.rejection_reason = Some(reason.to_string());
        self.write(&approval).map_err(Into::<VaultError>::into)?;
        Ok(approval)
    }

    fn validate_decision(
        &self,
        approval: &Approval,
        approver: &str,
        authorized_approvers: &HashMap<ActionType, Vec<String>>,
        now: DateTime<Utc>,
    ) -> Result<(), VaultError> {
        if approval.status != ApprovalStatus::Pending {
            return Err(VaultError::ApprovalInvalid {
                reason: format!("approval is not pending (status={})", approval.status),
            });
        }
        if approval.is_expired(now) {
            return Err(VaultError::ApprovalInvalid { reason: "approval has expired".to_string() });
        }
        let current_digest = content_digest(&approval.action_payload);
        if current_digest != approval.content_digest {
            return Err(VaultError::ApprovalInvalid {
                reason: "content digest mismatch; payload was tampered with".to_string(),
            });
        }
        let patterns = authorized_approvers.get(&approval.action_type).map(Vec::as_slice).unwrap_or(&[]);
        let allowed = patterns.iter().any(|pattern| glob_match(pattern, approver));
        if !allowed {
            return Err(VaultError::ApprovalInvalid {
                reason: format!(
                    "'{approver}' is not an authorized approver for action type '{}'",
                    approval.action_type
                ),
            });
        }
        Ok(())
    }

    /// All approvals on disk whose `task_id` matches. Used by the reasoning
    /// invoker to discover approval requests a subprocess produced.
    pub fn list_for_task(&self, task_id: &TaskId) -> Result<Vec<Approval>, StorageError> {
        let mut found = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(found),
            Err(e) => return Err(io_err(&self.root, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.root, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let contents = fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            let Some(rest) = contents.strip_prefix("---\n") else { continue };
            let Some(end) = rest.find("\n---") else { continue };
            let Ok(approval) = serde_yaml::from_str::<Approval>(&rest[..end]) else { continue };
            if &approval.task_id == task_id {
                found.push(approval);
            }
        }
        Ok(found)
    }

    /// If `approval_id` is pending and past its expiry, transition it to
    /// `timeout` and return the updated record. Idempotent.
    pub fn expire_if_due(
        &self,
        approval_id: &ApprovalId,
        now: DateTime<Utc>,
    ) -> Result<Option<Approval>, VaultError> {
        let _guard = self.write_lock.lock();
        let mut approval = self.load(approval_id).map_err(Into::<VaultError>::into)?;
        if approval.status != ApprovalStatus::Pending || !approval.is_expired(now) {
            return Ok(None);
        }
        approval.status = ApprovalStatus::Timeout;
        approval.decision_at = Some(now);
        self.write(&approval).map_err(Into::<VaultError>::into)?;
        Ok(Some(approval))
    }
}

fn io_err(path: impl AsRef<Path>, source: std::io::Error) -> StorageError {
    StorageError::Io { path: path.as_ref().display().to_string(), source }
}

#[cfg(test)]
#[path = "approval_store_tests.rs"]
mod tests;
