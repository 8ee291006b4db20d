// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Durable scheduler checkpoint: in-flight tasks, the stop flag, and
//! counters, written atomically (tempfile + rename + fsync) so a crash
//! mid-write never corrupts the last good checkpoint.

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InFlightEntry {
    pub state: String,
    pub attempts: u32,
    pub worker_id: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerCheckpoint {
    pub last_poll: DateTime<Utc>,
    pub tasks_in_flight: BTreeMap<String, InFlightEntry>,
    pub stop_requested: bool,
    pub counters: BTreeMap<String, u64>,
}

impl Default for SchedulerCheckpoint {
    fn default() -> Self {
        Self {
            last_poll: Utc::now(),
            tasks_in_flight: BTreeMap::new(),
            stop_requested: false,
            counters: BTreeMap::new(),
        }
    }
}

impl SchedulerCheckpoint {
    pub fn increment(&mut self, counter: &str) {
        *self.counters.entry(counter.to_string()).or_insert(0) += 1;
    }
}

/// Single-writer durable store for the [`SchedulerCheckpoint`].
pub struct Checkpointer {
    path: PathBuf,
}

impl Checkpointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the checkpoint, or a fresh default if none exists yet.
    pub fn load(&self) -> Result<SchedulerCheckpoint, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SchedulerCheckpoint::default()),
            Err(e) => Err(io_err(&self.path, e)),
        }
    }

    /// Atomically persist `checkpoint`: write to a sibling tempfile, fsync,
    /// then rename over the destination.
    pub fn save(&self, checkpoint: &SchedulerCheckpoint) -> Result<(), StorageError> {
        let contents = serde_json::to_vec_pretty(checkpoint)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp = fs::File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        tmp.write_all(&contents).map_err(|e| io_err(&tmp_path, e))?;
        tmp.sync_all().map_err(|e| io_err(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }
}

fn io_err(path: impl AsRef<Path>, source: std::io::Error) -> StorageError {
    StorageError::Io { path: path.as_ref().display().to_string(), source }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
