// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Driver trust registry: a JSON file mapping driver name to the SHA-256
//! digest of its trusted executable. `verify` is consulted on every
//! invocation — results are never cached across calls, so a binary
//! swapped out between invocations is always caught.

use crate::error::GuardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrustedDriver {
    digest: String,
    source: String,
    registered_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Registry {
    drivers: BTreeMap<String, TrustedDriver>,
}

pub struct DriverVerifier {
    path: PathBuf,
}

impl DriverVerifier {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Registry, GuardError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| GuardError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Registry::default()),
            Err(e) => Err(io_err(&self.path, e)),
        }
    }

    fn save(&self, registry: &Registry) -> Result<(), GuardError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let contents = serde_json::to_vec_pretty(registry).map_err(|e| GuardError::Serialization(e.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &contents).map_err(|e| io_err(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| io_err(&self.path, e))
    }

    /// Register `name` as trusted with the given pre-computed `digest`.
    pub fn register(&self, name: &str, digest: &str, source: &str) -> Result<(), GuardError> {
        let mut registry = self.load()?;
        registry.drivers.insert(
            name.to_string(),
            TrustedDriver { digest: digest.to_string(), source: source.to_string(), registered_at: Utc::now() },
        );
        self.save(&registry)
    }

    /// Recompute the SHA-256 of `binary_path` and compare against the
    /// registered digest for `name`. An unregistered driver is rejected.
    pub fn verify(&self, name: &str, binary_path: &Path) -> Result<(), GuardError> {
        let registry = self.load()?;
        let trusted = registry.drivers.get(name).ok_or_else(|| GuardError::UnknownDriver(name.to_string()))?;
        let bytes = fs::read(binary_path).map_err(|e| io_err(binary_path, e))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let actual = format!("{:x}", hasher.finalize());
        if actual != trusted.digest {
            return Err(GuardError::VerificationFailed {
                driver: name.to_string(),
                reason: "executable digest does not match trust registry".to_string(),
            });
        }
        Ok(())
    }
}

fn io_err(path: impl AsRef<Path>, source: std::io::Error) -> GuardError {
    GuardError::Io { path: path.as_ref().display().to_string(), source }
}

#[cfg(test)]
#[path = "driver_verifier_tests.rs"]
mod tests;
