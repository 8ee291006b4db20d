// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Durable, single-writer registry of consumed nonces. A nonce is added
//! exactly once, at the moment an approved approval is executed, which
//! prevents replay of the same approval file.

use crate::error::StorageError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use warden_core::Nonce;

pub struct NonceRegistry {
    path: PathBuf,
    consumed: Mutex<HashSet<String>>,
}

impl NonceRegistry {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let mut consumed = HashSet::new();
        if let Ok(file) = fs::File::open(&path) {
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|e| io_err(&path, e))?;
                if !line.is_empty() {
                    consumed.insert(line);
                }
            }
        }
        Ok(Self { path, consumed: Mutex::new(consumed) })
    }

    /// Atomically mark `nonce` as used. Returns `Ok(true)` the first time,
    /// `Ok(false)` if it was already consumed (a replay attempt).
    pub fn consume(&self, nonce: &Nonce) -> Result<bool, StorageError> {
        let mut guard = self.consumed.lock();
        if guard.contains(nonce.as_str()) {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| io_err(&self.path, e))?;
        writeln!(file, "{}", nonce.as_str()).map_err(|e| io_err(&self.path, e))?;
        file.sync_data().map_err(|e| io_err(&self.path, e))?;
        guard.insert(nonce.as_str().to_string());
        Ok(true)
    }

    pub fn is_consumed(&self, nonce: &Nonce) -> bool {
        self.consumed.lock().contains(nonce.as_str())
    }
}

fn io_err(path: impl AsRef<Path>, source: std::io::Error) -> StorageError {
    StorageError::Io { path: path.as_ref().display().to_string(), source }
}

#[cfg(test)]
#[path = "nonce_tests.rs"]
mod tests;
