// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! `wardend status` — a point-in-time snapshot read straight off disk.
//! There is no daemon/client socket in this design (the scheduler is a
//! single foreground process, not a supervisor with an IPC surface), so
//! status reconstructs what a running loop would report from the same
//! sources the loop itself trusts: the workflow folders, the scheduler
//! checkpoint, and the tail of the audit log.

use crate::output::{format_or_json, OutputFormat};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use warden_core::WorkflowFolder;
use warden_storage::{AuditFilter, AuditLog, Checkpointer};

#[derive(Serialize)]
struct StatusReport {
    folder_counts: Vec<(String, usize)>,
    last_poll: Option<chrono::DateTime<chrono::Utc>>,
    tasks_in_flight: usize,
    stop_requested: bool,
    recent_events: Vec<String>,
}

pub fn handle(vault_root: &Path, format: OutputFormat, recent: usize) -> Result<()> {
    let folder_counts: Vec<(String, usize)> = WorkflowFolder::ALL
        .iter()
        .map(|folder| (folder.dir_name().to_string(), count_markdown_files(&vault_root.join(folder.dir_name()))))
        .collect();

    let checkpoint_path = vault_root.join("checkpoint.json");
    let checkpoint = if checkpoint_path.exists() {
        Some(Checkpointer::new(&checkpoint_path).load().context("loading scheduler checkpoint")?)
    } else {
        None
    };

    let audit = AuditLog::open(vault_root.join("Logs")).context("opening audit log")?;
    let mut events = audit.query(&AuditFilter::default()).context("querying audit log")?;
    events.sort_by_key(|e| std::cmp::Reverse(e.ts));
    events.truncate(recent);

    let report = StatusReport {
        folder_counts,
        last_poll: checkpoint.as_ref().map(|c| c.last_poll),
        tasks_in_flight: checkpoint.as_ref().map(|c| c.tasks_in_flight.len()).unwrap_or(0),
        stop_requested: vault_root.join(".stop_hook").exists(),
        recent_events: events.iter().map(|e| format!("{} {} {}", e.ts.to_rfc3339(), e.event_type, e.actor)).collect(),
    };

    format_or_json(format, &report, || {
        println!("vault: {}", vault_root.display());
        for (name, count) in &report.folder_counts {
            println!("  {:<20} {}", name, count);
        }
        match report.last_poll {
            Some(ts) => println!("last poll: {}", ts.to_rfc3339()),
            None => println!("last poll: never (no checkpoint yet)"),
        }
        println!("tasks in flight: {}", report.tasks_in_flight);
        println!("paused: {}", report.stop_requested);
        if !report.recent_events.is_empty() {
            println!("\nrecent events:");
            for line in &report.recent_events {
                println!("  {line}");
            }
        }
    })
}

fn count_markdown_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("md"))
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
