// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;

#[test]
fn a_missing_config_file_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("missing.yaml")).unwrap();
    assert_eq!(config.max_concurrent_tasks, 2);
    assert_eq!(config.retry_delays_secs, vec![60, 300, 900, 3600, 14_400]);
}

#[test]
fn a_partial_yaml_document_fills_the_rest_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.yaml");
    std::fs::write(&path, "max_concurrent_tasks: 7\nvault_root: /srv/vault\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.max_concurrent_tasks, 7);
    assert_eq!(config.vault_root, PathBuf::from("/srv/vault"));
    assert_eq!(config.poll_interval_secs, 30);
}

#[test]
fn malformed_yaml_is_a_hard_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.yaml");
    std::fs::write(&path, "max_concurrent_tasks: [this is not a number]\n").unwrap();

    assert!(Config::load(&path).is_err());
}

#[test]
#[serial_test::serial]
fn an_env_override_wins_over_the_file_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.yaml");
    std::fs::write(&path, "max_concurrent_tasks: 7\n").unwrap();

    std::env::set_var("WARDEN_MAX_CONCURRENT_TASKS", "3");
    let result = Config::load(&path);
    std::env::remove_var("WARDEN_MAX_CONCURRENT_TASKS");

    assert_eq!(result.unwrap().max_concurrent_tasks, 3);
}

#[test]
fn sub_config_conversions_carry_the_configured_values() {
    let mut config = Config::default();
    config.max_concurrent_tasks = 9;
    config.retry_max_attempts = 2;
    config.retry_delays_secs = vec![5, 10];

    assert_eq!(config.scheduler_config().max_concurrent_tasks, 9);
    let retry = config.retry_config();
    assert_eq!(retry.max_attempts, 2);
    assert_eq!(retry.delays, vec![Duration::from_secs(5), Duration::from_secs(10)]);
}

#[test]
fn authorized_approvers_are_scoped_per_action_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.yaml");
    std::fs::write(
        &path,
        "authorized_approvers:\n  payment:\n    - \"*@company.com\"\n  delete:\n    - admin@company.com\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.authorized_approvers.get(&ActionType::Payment).unwrap(), &vec!["*@company.com".to_string()]);
    assert_eq!(config.authorized_approvers.get(&ActionType::Delete).unwrap(), &vec!["admin@company.com".to_string()]);
    assert!(config.authorized_approvers.get(&ActionType::Message).is_none());
}

#[test]
fn rate_limits_override_the_per_driver_per_action_type_bucket() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.yaml");
    std::fs::write(
        &path,
        "rate_limits:\n  shell:\n    payment:\n      per_minute: 2.0\n      per_hour: 30.0\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    let limiter = config.rate_limiter(warden_core::FakeClock::new());
    assert!(limiter.consume("shell:payment", 1.0));
    assert!(limiter.consume("shell:payment", 1.0));
    assert!(!limiter.consume("shell:payment", 1.0));
}

#[test]
fn approval_timeouts_override_an_action_types_default_ttl() {
    let mut config = Config::default();
    config.approval_timeouts.insert(ActionType::Message, 900);

    assert_eq!(config.approval_ttl(&ActionType::Message), chrono::Duration::seconds(900));
    assert_eq!(config.approval_ttl(&ActionType::Payment), ActionType::Payment.default_ttl());
}

#[test]
fn driver_entries_in_yaml_become_registered_bindings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.yaml");
    std::fs::write(
        &path,
        "drivers:\n  shell:\n    binary_path: /usr/local/bin/warden-shell-driver\n    timeout_secs: 45\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    let registry = config.driver_registry();
    let binding = registry.get("shell").unwrap();
    assert_eq!(binding.binary_path, PathBuf::from("/usr/local/bin/warden-shell-driver"));
    assert_eq!(binding.timeout, Duration::from_secs(45));
}
