// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;

#[test]
fn filesystem_and_validation_errors_are_permanent() {
    assert_eq!(
        VaultError::FileSystemError { message: "rename failed".into() }.classify(),
        ErrorClass::Permanent
    );
    assert_eq!(
        VaultError::ValidationError { reason: "bad frontmatter".into() }.classify(),
        ErrorClass::Permanent
    );
}

#[test]
fn reasoning_and_throttling_errors_are_retryable() {
    assert_eq!(
        VaultError::ReasoningTimeout { elapsed_secs: 30 }.classify(),
        ErrorClass::Retryable
    );
    assert_eq!(
        VaultError::ReasoningCrashed { detail: "exit 137".into() }.classify(),
        ErrorClass::Retryable
    );
    assert_eq!(
        VaultError::Throttled { driver: "mail-sender".into(), action_type: "message".into() }
            .classify(),
        ErrorClass::Retryable
    );
    assert_eq!(
        VaultError::CircuitOpen { driver: "mail-sender".into() }.classify(),
        ErrorClass::Retryable
    );
}

#[test]
fn driver_failure_classification_follows_its_own_flag() {
    let retryable = VaultError::DriverFailure {
        driver: "mail-sender".into(),
        message: "connection reset".into(),
        retryable: true,
    };
    let permanent = VaultError::DriverFailure {
        driver: "mail-sender".into(),
        message: "invalid recipient".into(),
        retryable: false,
    };
    assert_eq!(retryable.classify(), ErrorClass::Retryable);
    assert_eq!(permanent.classify(), ErrorClass::Permanent);
}

#[test]
fn nonce_reuse_and_approval_invalid_are_permanent_and_high_severity() {
    assert_eq!(
        VaultError::NonceReused { approval_id: "apr_123".into() }.classify(),
        ErrorClass::Permanent
    );
    assert_eq!(
        VaultError::ApprovalInvalid { reason: "digest mismatch".into() }.classify(),
        ErrorClass::Permanent
    );
}

#[test]
fn label_is_stable_and_distinct_from_display_message() {
    let err = VaultError::Throttled { driver: "mail-sender".into(), action_type: "message".into() };
    assert_eq!(err.label(), "throttled");
    assert!(err.to_string().contains("mail-sender"));
}
