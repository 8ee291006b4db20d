// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Append-only audit log: daily-rotated, size-rotated-with-gzip files
//! under `Logs/`, plus a separate `security-*.log` channel for
//! credential/verification/rate-limit events. Single-writer per file,
//! guarded by a mutex so concurrent workers serialize through it.

use crate::error::StorageError;
use chrono::{NaiveDate, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use warden_core::{AuditEvent, AuditLevel};

/// Size threshold above which a log file is rotated and gzipped.
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;

/// On-disk envelope around an [`AuditEvent`]: a monotonic insert sequence
/// is attached so readers can restore total order across a rotation
/// overlap, since two writers' wall-clock timestamps may tie.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuditRecord {
    seq: u64,
    #[serde(flatten)]
    event: AuditEvent,
}

/// Filter applied by [`AuditLog::query`].
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub task_id: Option<String>,
    pub approval_id: Option<String>,
    pub event_type_prefix: Option<String>,
    pub min_level: Option<AuditLevel>,
    pub since: Option<chrono::DateTime<Utc>>,
}

impl AuditFilter {
    fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(task_id) = &self.task_id {
            if event.task_id.as_deref() != Some(task_id.as_str()) {
                return false;
            }
        }
        if let Some(approval_id) = &self.approval_id {
            if event.approval_id.as_deref() != Some(approval_id.as_str()) {
                return false;
            }
        }
        if let Some(prefix) = &self.event_type_prefix {
            if !event.event_type.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(min_level) = self.min_level {
            if event.level < min_level {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.ts < since {
                return false;
            }
        }
        true
    }
}

fn is_security_event(event: &AuditEvent) -> bool {
    const SECURITY_PREFIXES: &[&str] =
        &["driver.verification", "rate_limited", "circuit_", "credential.", "nonce."];
    event.level >= AuditLevel::Warn
        || SECURITY_PREFIXES.iter().any(|prefix| event.event_type.starts_with(prefix))
}

struct OpenFile {
    date: NaiveDate,
    file: File,
}

/// Append-only structured event log.
pub struct AuditLog {
    root: PathBuf,
    sequence: AtomicU64,
    degraded: AtomicBool,
    main: Mutex<Option<OpenFile>>,
    security: Mutex<Option<OpenFile>>,
}

impl AuditLog {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
        Ok(Self {
            root,
            sequence: AtomicU64::new(0),
            degraded: AtomicBool::new(false),
            main: Mutex::new(None),
            security: Mutex::new(None),
        })
    }

    /// Whether the last append attempt failed even after a retry.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Append one event, redacting its free-text fields first and routing
    /// to the security channel as well when it qualifies.
    pub fn append(&self, event: &AuditEvent) -> Result<(), StorageError> {
        let redacted = redact_event(event);
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let record = AuditRecord { seq, event: redacted };
        let line = serde_json::to_string(&record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let result = self.write_line(&self.main, "", &line).or_else(|_| self.write_line(&self.main, "", &line));
        match result {
            Ok(()) => self.degraded.store(false, Ordering::Relaxed),
            Err(e) => {
                tracing::error!(error = %e, "audit log append failed after retry; degrading");
                eprintln!("[audit-degraded] {line}");
                self.degraded.store(true, Ordering::Relaxed);
                return Err(e);
            }
        }

        if is_security_event(&record.event) {
            // Security-channel mirroring is best-effort: a failure here
            // does not fail the caller's primary append.
            let _ = self.write_line(&self.security, "security-", &line);
        }
        Ok(())
    }

    fn write_line(
        &self,
        slot: &Mutex<Option<OpenFile>>,
        file_prefix: &str,
        line: &str,
    ) -> Result<(), StorageError> {
        let today = Utc::now().date_naive();
        let mut guard = slot.lock();
        let needs_reopen = match &*guard {
            Some(open) => open.date != today,
            None => true,
        };
        if needs_reopen {
            let path = self.root.join(format!("{file_prefix}{}.log", today));
            self.rotate_if_oversized(&path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| io_err(&path, e))?;
            *guard = Some(OpenFile { date: today, file });
        }
        let open = guard.as_mut().expect("just opened above");
        writeln!(open.file, "{line}").map_err(|e| io_err(&self.root, e))?;
        open.file.sync_data().map_err(|e| io_err(&self.root, e))
    }

    fn rotate_if_oversized(&self, path: &Path) -> Result<(), StorageError> {
        let Ok(metadata) = fs::metadata(path) else {
            return Ok(());
        };
        if metadata.len() < ROTATE_AT_BYTES {
            return Ok(());
        }
        let mut suffix = 1u32;
        loop {
            let rotated = path.with_extension(format!("log.{suffix}.gz"));
            if !rotated.exists() {
                let contents = fs::read(path).map_err(|e| io_err(path, e))?;
                let gz_file = File::create(&rotated).map_err(|e| io_err(&rotated, e))?;
                let mut encoder = GzEncoder::new(gz_file, Compression::default());
                encoder.write_all(&contents).map_err(|e| io_err(&rotated, e))?;
                encoder.finish().map_err(|e| io_err(&rotated, e))?;
                fs::remove_file(path).map_err(|e| io_err(path, e))?;
                return Ok(());
            }
            suffix += 1;
        }
    }

    /// Scan the (uncompressed) daily log files and return matching events,
    /// in on-disk order.
    pub fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>, StorageError> {
        let mut results = Vec::new();
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.root)
            .map_err(|e| io_err(&self.root, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("log"))
            .collect();
        paths.sort();
        for path in paths {
            let file = File::open(&path).map_err(|e| io_err(&path, e))?;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|e| io_err(&path, e))?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: AuditRecord = serde_json::from_str(&line)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                if filter.matches(&record.event) {
                    results.push(record.event);
                }
            }
        }
        Ok(results)
    }
}

fn redact_event(event: &AuditEvent) -> AuditEvent {
    let mut redacted = event.clone();
    let mut context = std::collections::BTreeMap::new();
    for (key, value) in &event.redacted_context {
        context.insert(key.clone(), warden_secrets::redact(value));
    }
    redacted.redacted_context = context;
    redacted
}

fn io_err(path: impl AsRef<Path>, source: std::io::Error) -> StorageError {
    StorageError::Io { path: path.as_ref().display().to_string(), source }
}

#[cfg(test)]
#[path = "audit_log_tests.rs"]
mod tests;
