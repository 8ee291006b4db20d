// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! `wardend init` — scaffold a fresh vault: one directory per
//! [`WorkflowFolder`] (this already covers the `Logs/`/`Approvals/`
//! persistence roots) and a `warden.yaml` seeded with the documented
//! defaults.

use crate::config::Config;
use anyhow::{Context, Result};
use std::path::Path;
use warden_core::WorkflowFolder;

pub fn handle(vault_root: &Path, config_path: &Path, force: bool) -> Result<()> {
    for folder in WorkflowFolder::ALL {
        let dir = vault_root.join(folder.dir_name());
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    if config_path.exists() && !force {
        println!("{} already exists; pass --force to overwrite", config_path.display());
    } else {
        let config = Config { vault_root: vault_root.to_path_buf(), ..Config::default() };
        let yaml = serde_yaml::to_string(&config).context("serializing default config")?;
        std::fs::write(config_path, yaml).with_context(|| format!("writing {}", config_path.display()))?;
        println!("wrote {}", config_path.display());
    }

    println!("vault initialized at {}", vault_root.display());
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
