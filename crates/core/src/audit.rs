// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! The audit event record, shared by every component that writes to the
//! append-only audit log (owned and persisted by `warden-storage`).

use crate::id::TraceId;
use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::define_id! {
    /// Unique identifier for an approval record.
    pub struct ApprovalId("apr-")
}

/// Severity of an audit event, used for routing into the security channel
/// and for health degradation signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    Info,
    Warn,
    Error,
    Critical,
}

crate::simple_display! {
    AuditLevel {
        Info => "info",
        Warn => "warn",
        Error => "error",
        Critical => "critical",
    }
}

/// Outcome of the action an audit event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Ok,
    Err,
}

crate::simple_display! {
    AuditOutcome {
        Ok => "ok",
        Err => "err",
    }
}

/// A single append-only audit record.
///
/// `redacted_context` carries structured extra fields (e.g. driver
/// exit code, rejection reason) that have already passed through the
/// secrets scanner; no component may attach raw, unredacted payload
/// data here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub ts: DateTime<Utc>,
    pub trace_id: TraceId,
    pub level: AuditLevel,
    pub event_type: String,
    pub actor: String,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub approval_id: Option<ApprovalId>,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    pub outcome: AuditOutcome,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub redacted_context: BTreeMap<String, String>,
}

crate::builder! {
    pub struct AuditEventBuilder => AuditEvent {
        computed { ts: DateTime<Utc> = Utc::now() }
        computed { trace_id: TraceId = TraceId::new() }
        set { level: AuditLevel = AuditLevel::Info }
        into { event_type: String = "event" }
        into { actor: String = "system" }
        option { task_id: TaskId = None }
        option { approval_id: ApprovalId = None }
        option { driver: String = None }
        option { action_type: String = None }
        set { outcome: AuditOutcome = AuditOutcome::Ok }
        option { duration_ms: u64 = None }
        computed { redacted_context: BTreeMap<String, String> = BTreeMap::new() }
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
