// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;
use warden_core::WorkflowFolder;

#[test]
fn init_creates_every_workflow_folder_and_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let vault_root = dir.path().join("vault");
    let config_path = dir.path().join("warden.yaml");

    handle(&vault_root, &config_path, false).unwrap();

    for folder in WorkflowFolder::ALL {
        assert!(vault_root.join(folder.dir_name()).is_dir(), "missing {}", folder.dir_name());
    }
    assert!(vault_root.join("Logs").is_dir());
    assert!(vault_root.join("Approvals").is_dir());
    assert!(config_path.exists());
}

#[test]
fn init_does_not_clobber_an_existing_config_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let vault_root = dir.path().join("vault");
    let config_path = dir.path().join("warden.yaml");
    std::fs::write(&config_path, "max_concurrent_tasks: 99\n").unwrap();

    handle(&vault_root, &config_path, false).unwrap();

    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("99"));
}

#[test]
fn init_overwrites_with_force() {
    let dir = tempfile::tempdir().unwrap();
    let vault_root = dir.path().join("vault");
    let config_path = dir.path().join("warden.yaml");
    std::fs::write(&config_path, "max_concurrent_tasks: 99\n").unwrap();

    handle(&vault_root, &config_path, true).unwrap();

    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(!contents.contains("99"));
}
