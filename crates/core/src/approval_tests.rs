// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;

#[test]
fn action_type_round_trips_known_variants() {
    for (raw, expected) in [
        ("payment", ActionType::Payment),
        ("message", ActionType::Message),
        ("delete", ActionType::Delete),
        ("deploy", ActionType::Deploy),
    ] {
        assert_eq!(ActionType::parse(raw), expected);
        assert_eq!(ActionType::parse(raw).as_str(), raw);
    }
}

#[test]
fn unknown_action_type_falls_back_to_other() {
    assert_eq!(ActionType::parse("archive"), ActionType::Other("archive".to_string()));
}

#[test]
fn default_ttl_matches_action_type_table() {
    assert_eq!(ActionType::Payment.default_ttl(), chrono::Duration::hours(24));
    assert_eq!(ActionType::Message.default_ttl(), chrono::Duration::hours(6));
    assert_eq!(ActionType::Delete.default_ttl(), chrono::Duration::hours(12));
    assert_eq!(ActionType::Deploy.default_ttl(), chrono::Duration::hours(4));
}

#[test]
fn pending_status_is_not_terminal_but_others_are() {
    assert!(!ApprovalStatus::Pending.is_terminal());
    assert!(ApprovalStatus::Approved.is_terminal());
    assert!(ApprovalStatus::Rejected.is_terminal());
    assert!(ApprovalStatus::Timeout.is_terminal());
}

#[test]
fn is_expired_compares_against_expires_at() {
    let approval = Approval::builder().expires_at(Utc::now() - chrono::Duration::seconds(1)).build();
    assert!(approval.is_expired(Utc::now()));
}

#[test]
fn nonce_is_fresh_per_approval() {
    let a = Approval::builder().build();
    let b = Approval::builder().build();
    assert_ne!(a.nonce, b.nonce);
}
