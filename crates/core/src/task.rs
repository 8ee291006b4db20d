// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! The task record: frontmatter fields, canonical filename grammar, and
//! the fixed set of vault workflow folders.

use crate::error::VaultError;
use crate::slug::slugify;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

crate::define_id! {
    /// Unique identifier for a task, derived from its canonical filename.
    pub struct TaskId("tsk-")
}

/// Where a task entered the vault from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    Mail,
    Chat,
    Filesystem,
    Manual,
}

crate::simple_display! {
    TaskSource {
        Mail => "mail",
        Chat => "chat",
        Filesystem => "filesystem",
        Manual => "manual",
    }
}

impl TaskSource {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mail" => Some(Self::Mail),
            "chat" => Some(Self::Chat),
            "filesystem" => Some(Self::Filesystem),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Task urgency as declared in frontmatter (distinct from the scorer's
/// derived numeric urgency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

crate::simple_display! {
    Priority {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

/// The fixed set of vault workflow folders. Created at init, never renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowFolder {
    Inbox,
    NeedsAction,
    Plans,
    PendingApproval,
    Approved,
    Rejected,
    Done,
    ErrorQueue,
    Failed,
    NeedsHumanReview,
    Logs,
    Briefings,
    Approvals,
}

impl WorkflowFolder {
    /// All folders, in the order they are created at vault init.
    pub const ALL: [WorkflowFolder; 13] = [
        Self::Inbox,
        Self::NeedsAction,
        Self::Plans,
        Self::PendingApproval,
        Self::Approved,
        Self::Rejected,
        Self::Done,
        Self::ErrorQueue,
        Self::Failed,
        Self::NeedsHumanReview,
        Self::Logs,
        Self::Briefings,
        Self::Approvals,
    ];

    /// The on-disk directory name, matching this folder's variant name.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::NeedsAction => "Needs_Action",
            Self::Plans => "Plans",
            Self::PendingApproval => "Pending_Approval",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Done => "Done",
            Self::ErrorQueue => "Error_Queue",
            Self::Failed => "Failed",
            Self::NeedsHumanReview => "Needs_Human_Review",
            Self::Logs => "Logs",
            Self::Briefings => "Briefings",
            Self::Approvals => "Approvals",
        }
    }

    pub fn parse(dir_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|folder| folder.dir_name() == dir_name)
    }

    /// Whether the transition matrix declares an edge `self -> target`.
    pub fn can_transition_to(&self, target: WorkflowFolder) -> bool {
        TRANSITION_MATRIX
            .iter()
            .any(|(from, to)| *from == *self && *to == target)
    }
}

/// The allowed transition matrix; any pair not listed here is forbidden.
pub const TRANSITION_MATRIX: &[(WorkflowFolder, WorkflowFolder)] = &[
    (WorkflowFolder::Inbox, WorkflowFolder::NeedsAction),
    (WorkflowFolder::Inbox, WorkflowFolder::Rejected),
    (WorkflowFolder::NeedsAction, WorkflowFolder::Plans),
    (WorkflowFolder::NeedsAction, WorkflowFolder::Inbox),
    (WorkflowFolder::NeedsAction, WorkflowFolder::Rejected),
    (WorkflowFolder::Plans, WorkflowFolder::PendingApproval),
    (WorkflowFolder::Plans, WorkflowFolder::NeedsAction),
    (WorkflowFolder::Plans, WorkflowFolder::Rejected),
    (WorkflowFolder::PendingApproval, WorkflowFolder::Approved),
    (WorkflowFolder::PendingApproval, WorkflowFolder::Rejected),
    (WorkflowFolder::PendingApproval, WorkflowFolder::NeedsHumanReview),
    (WorkflowFolder::Approved, WorkflowFolder::Done),
    (WorkflowFolder::Approved, WorkflowFolder::ErrorQueue),
    (WorkflowFolder::Approved, WorkflowFolder::Rejected),
    (WorkflowFolder::ErrorQueue, WorkflowFolder::NeedsAction),
    (WorkflowFolder::ErrorQueue, WorkflowFolder::Failed),
    (WorkflowFolder::NeedsHumanReview, WorkflowFolder::NeedsAction),
    (WorkflowFolder::NeedsHumanReview, WorkflowFolder::Rejected),
];

/// A task's frontmatter, in the stable key order written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub source: TaskSource,
    pub sender: Option<String>,
    pub subject: String,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub state: WorkflowFolder,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub next_retry_at: Option<DateTime<Utc>>,
}

crate::builder! {
    pub struct TaskBuilder => Task {
        set { task_id: TaskId = TaskId::new() }
        set { source: TaskSource = TaskSource::Manual }
        option { sender: String = None }
        into { subject: String = "Untitled task" }
        set { priority: Priority = Priority::Medium }
        option { deadline: DateTime<Utc> = None }
        computed { created_at: DateTime<Utc> = Utc::now() }
        set { state: WorkflowFolder = WorkflowFolder::Inbox }
        computed { retry_count: u32 = 0 }
        computed { last_error: Option<String> = None }
        computed { next_retry_at: Option<DateTime<Utc>> = None }
    }
}

fn filename_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-z]+)_([a-z0-9-]+)_(\d{4}-\d{2}-\d{2}T\d{2}-\d{2})\.md$")
            .expect("static filename regex is valid")
    })
}

impl Task {
    /// Build the canonical `<source>_<subject-slug>_<ISO-minute>.md` filename.
    pub fn filename(&self) -> String {
        let slug = slugify(&self.subject, 40);
        let minute = self.created_at.format("%Y-%m-%dT%H-%M");
        format!("{}_{}_{}.md", self.source, slug, minute)
    }

    /// Validate a filename against the canonical grammar, returning the
    /// parsed `(source, slug, minute-timestamp)` components.
    pub fn parse_filename(name: &str) -> Result<(TaskSource, String, DateTime<Utc>), VaultError> {
        let captures = filename_regex().captures(name).ok_or_else(|| VaultError::ValidationError {
            reason: format!("filename '{name}' does not match the canonical pattern"),
        })?;
        let source = TaskSource::parse(&captures[1]).ok_or_else(|| VaultError::ValidationError {
            reason: format!("unknown source prefix '{}' in filename '{name}'", &captures[1]),
        })?;
        let slug = captures[2].to_string();
        let naive = NaiveDateTime::parse_from_str(&captures[3], "%Y-%m-%dT%H-%M")
            .map_err(|e| VaultError::ValidationError {
                reason: format!("invalid timestamp in filename '{name}': {e}"),
            })?;
        Ok((source, slug, naive.and_utc()))
    }

    /// Parse a vault markdown file's `---`-delimited frontmatter block plus body.
    pub fn parse_document(contents: &str) -> Result<(Task, String), VaultError> {
        let rest = contents.strip_prefix("---\n").ok_or_else(|| VaultError::ValidationError {
            reason: "document is missing opening frontmatter delimiter".to_string(),
        })?;
        let end = rest.find("\n---").ok_or_else(|| VaultError::ValidationError {
            reason: "document is missing closing frontmatter delimiter".to_string(),
        })?;
        let frontmatter_block = &rest[..end];
        let body = rest[end + "\n---".len()..].trim_start_matches('\n').to_string();
        let task: Task = serde_yaml::from_str(frontmatter_block).map_err(|e| VaultError::ValidationError {
            reason: format!("malformed frontmatter: {e}"),
        })?;
        Ok((task, body))
    }

    /// Serialize this task's frontmatter and the given body back into a
    /// `---`-delimited document with a stable key order and trailing newline.
    pub fn to_document(&self, body: &str) -> Result<String, VaultError> {
        let frontmatter = serde_yaml::to_string(self).map_err(|e| VaultError::ValidationError {
            reason: format!("failed to serialize frontmatter: {e}"),
        })?;
        let mut doc = String::with_capacity(frontmatter.len() + body.len() + 16);
        doc.push_str("---\n");
        doc.push_str(frontmatter.trim_end());
        doc.push_str("\n---\n");
        doc.push_str(body);
        if !doc.ends_with('\n') {
            doc.push('\n');
        }
        Ok(doc)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
