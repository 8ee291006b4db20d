// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;

#[test]
fn registering_a_binary_makes_it_pass_verification() {
    let dir = tempfile::tempdir().unwrap();
    let trust_path = dir.path().join("trust.json");
    let binary_path = dir.path().join("tool");
    std::fs::write(&binary_path, b"#!/bin/sh\necho hi\n").unwrap();

    register(&trust_path, "noop", &binary_path, "test").unwrap();

    let verifier = DriverVerifier::open(&trust_path);
    assert!(verifier.verify("noop", &binary_path).is_ok());
}

#[test]
fn a_missing_binary_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let trust_path = dir.path().join("trust.json");
    let binary_path = dir.path().join("missing");

    assert!(register(&trust_path, "noop", &binary_path, "test").is_err());
}
