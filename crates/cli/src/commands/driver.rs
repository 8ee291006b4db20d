// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! `wardend driver register` — hash a driver binary and add it to the
//! trust registry `ActionGuard` consults before ever spawning it.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use warden_guard::DriverVerifier;

pub fn register(trust_store_path: &Path, name: &str, binary_path: &Path, source: &str) -> Result<()> {
    let bytes = std::fs::read(binary_path).with_context(|| format!("reading {}", binary_path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = format!("{:x}", hasher.finalize());

    let verifier = DriverVerifier::open(trust_store_path);
    verifier.register(name, &digest, source).context("writing trust registry entry")?;

    println!("registered driver '{name}' -> {digest} ({source})");
    Ok(())
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
