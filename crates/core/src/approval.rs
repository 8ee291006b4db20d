// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! The approval record: a human-in-the-loop gate on a sensitive action,
//! protected by a single-use nonce and a content-integrity digest.

use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The kind of side effect an approval authorizes.
///
/// Serializes as its bare name (`"payment"`, `"delete"`, or the raw string
/// for `Other`), not the default derive's `{other: "..."}` map shape, so
/// it round-trips as a plain scalar wherever it is used as a YAML map key
/// (e.g. `authorized_approvers`, `rate_limits`, `approval_timeouts`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionType {
    Payment,
    Message,
    Delete,
    Deploy,
    Other(String),
}

impl Serialize for ActionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Payment => "payment",
            Self::Message => "message",
            Self::Delete => "delete",
            Self::Deploy => "deploy",
            Self::Other(s) => s.as_str(),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "payment" => Self::Payment,
            "message" => Self::Message,
            "delete" => Self::Delete,
            "deploy" => Self::Deploy,
            other => Self::Other(other.to_string()),
        }
    }

    /// Default time-to-live for an approval of this action type, per §4.H.
    pub fn default_ttl(&self) -> chrono::Duration {
        match self {
            Self::Payment => chrono::Duration::hours(24),
            Self::Message => chrono::Duration::hours(6),
            Self::Delete => chrono::Duration::hours(12),
            Self::Deploy => chrono::Duration::hours(4),
            Self::Other(_) => chrono::Duration::hours(12),
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk tier assigned by the reasoning stage when it requests an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

crate::simple_display! {
    RiskLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// Lifecycle state of an [`Approval`]. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Timeout,
}

impl ApprovalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

crate::simple_display! {
    ApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Timeout => "timeout",
    }
}

crate::define_id! {
    /// Single-use nonce: a 23-character random alphanumeric token
    /// (~119 bits of entropy), consumed exactly once at execution time.
    pub struct Nonce("")
}

/// A markdown file in `Approvals/` gating one side effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    pub approval_id: crate::audit::ApprovalId,
    pub task_id: TaskId,
    pub action_type: ActionType,
    pub risk_level: RiskLevel,
    pub status: ApprovalStatus,
    pub nonce: Nonce,
    pub content_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub approver: Option<String>,
    #[serde(default)]
    pub decision_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    pub action_payload: serde_json::Value,
}

impl Approval {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

crate::builder! {
    pub struct ApprovalBuilder => Approval {
        computed { approval_id: crate::audit::ApprovalId = crate::audit::ApprovalId::new() }
        set { task_id: TaskId = TaskId::new() }
        set { action_type: ActionType = ActionType::Message }
        set { risk_level: RiskLevel = RiskLevel::Low }
        set { status: ApprovalStatus = ApprovalStatus::Pending }
        computed { nonce: Nonce = Nonce::new() }
        into { content_digest: String = "" }
        computed { created_at: DateTime<Utc> = Utc::now() }
        set { expires_at: DateTime<Utc> = Utc::now() + chrono::Duration::hours(12) }
        option { approver: String = None }
        option { decision_at: DateTime<Utc> = None }
        option { rejection_reason: String = None }
        computed { action_payload: serde_json::Value = serde_json::Value::Null }
    }
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
