// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;
use std::time::Duration;

#[test]
fn an_unregistered_driver_name_returns_none() {
    let registry = DriverRegistry::new();
    assert!(registry.get("mail-sender").is_none());
}

#[test]
fn a_registered_driver_is_found_by_name() {
    let mut registry = DriverRegistry::new();
    registry.register("mail-sender", DriverBinding { binary_path: "/usr/local/bin/mail-sender".into(), timeout: Duration::from_secs(30) });

    let binding = registry.get("mail-sender").unwrap();
    assert_eq!(binding.timeout, Duration::from_secs(30));
}
