// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

#![cfg(unix)]

use super::*;
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::rate_limiter::RateLimitConfig;
use sha2::{Digest, Sha256};
use warden_core::{ActionType, FakeClock, RiskLevel};

struct Fixture {
    _dir: tempfile::TempDir,
    guard: ActionGuard<FakeClock>,
    binding: DriverBinding,
}

fn register_binary(verifier: &DriverVerifier, name: &str, path: &std::path::Path) {
    let bytes = std::fs::read(path).unwrap();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = format!("{:x}", hasher.finalize());
    verifier.register(name, &digest, "system binary").unwrap();
}

fn fixture(binary: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let verifier = DriverVerifier::open(dir.path().join("trust.json"));
    let binary_path = std::path::PathBuf::from(binary);
    register_binary(&verifier, "noop", &binary_path);

    let rate_limiter = RateLimiter::new(RateLimitConfig { capacity: 10.0, refill_rate: 1.0 }, clock.clone());
    let approvals = ApprovalStore::open(dir.path().join("Approvals")).unwrap();
    let nonces = NonceRegistry::open(dir.path().join("nonces.log")).unwrap();
    let audit = AuditLog::open(dir.path().join("Logs")).unwrap();

    let guard = ActionGuard::new(
        verifier,
        rate_limiter,
        CircuitBreakerConfig::default(),
        approvals,
        nonces,
        audit,
        clock,
    );
    Fixture { _dir: dir, guard, binding: DriverBinding { binary_path, timeout: Duration::from_secs(5) } }
}

#[tokio::test]
async fn unregistered_driver_is_rejected_before_any_side_effect() {
    let fx = fixture("/bin/true");
    let err =
        fx.guard.execute("unregistered", "message", serde_json::json!({}), &fx.binding, None).await.unwrap_err();
    assert_eq!(err.label(), "verification_error");
}

#[tokio::test]
async fn successful_invocation_with_no_approval_required() {
    let fx = fixture("/bin/true");
    let outcome =
        fx.guard.execute("noop", "message", serde_json::json!({"text": "hi"}), &fx.binding, None).await.unwrap();
    assert_eq!(outcome.exit_code, 0);
}

#[tokio::test]
async fn rate_limiter_throttles_after_capacity_is_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let verifier = DriverVerifier::open(dir.path().join("trust.json"));
    register_binary(&verifier, "noop", std::path::Path::new("/bin/true"));
    let rate_limiter = RateLimiter::new(RateLimitConfig { capacity: 1.0, refill_rate: 0.0 }, clock.clone());
    let approvals = ApprovalStore::open(dir.path().join("Approvals")).unwrap();
    let nonces = NonceRegistry::open(dir.path().join("nonces.log")).unwrap();
    let audit = AuditLog::open(dir.path().join("Logs")).unwrap();
    let guard = ActionGuard::new(
        verifier,
        rate_limiter,
        CircuitBreakerConfig::default(),
        approvals,
        nonces,
        audit,
        clock,
    );
    let binding = DriverBinding { binary_path: "/bin/true".into(), timeout: Duration::from_secs(5) };

    guard.execute("noop", "message", serde_json::json!({}), &binding, None).await.unwrap();
    let err = guard.execute("noop", "message", serde_json::json!({}), &binding, None).await.unwrap_err();
    assert_eq!(err.label(), "throttled");
}

#[tokio::test]
async fn approval_required_rejects_when_not_approved() {
    let fx = fixture("/bin/true");
    let approval = fx
        .guard
        .approvals
        .create(warden_core::TaskId::new(), ActionType::Payment, RiskLevel::High, serde_json::json!({}), None, Utc::now())
        .unwrap();

    let err = fx
        .guard
        .execute("noop", "payment", serde_json::json!({}), &fx.binding, Some(approval.approval_id))
        .await
        .unwrap_err();
    assert_eq!(err.label(), "approval_invalid");
}

#[tokio::test]
async fn approved_action_consumes_the_nonce_exactly_once() {
    let fx = fixture("/bin/true");
    let approval = fx
        .guard
        .approvals
        .create(warden_core::TaskId::new(), ActionType::Payment, RiskLevel::High, serde_json::json!({}), None, Utc::now())
        .unwrap();
    let authorized_approvers =
        std::collections::HashMap::from([(ActionType::Payment, vec!["*".to_string()])]);
    fx.guard.approvals.approve(&approval.approval_id, "ceo@company.com", &authorized_approvers, Utc::now()).unwrap();

    fx.guard
        .execute("noop", "payment", serde_json::json!({}), &fx.binding, Some(approval.approval_id))
        .await
        .unwrap();

    let err = fx
        .guard
        .execute("noop", "payment", serde_json::json!({}), &fx.binding, Some(approval.approval_id))
        .await
        .unwrap_err();
    assert_eq!(err.label(), "nonce_reused");
}

#[tokio::test]
async fn driver_failure_trips_the_circuit_after_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let verifier = DriverVerifier::open(dir.path().join("trust.json"));
    register_binary(&verifier, "noop", std::path::Path::new("/bin/false"));
    let rate_limiter = RateLimiter::new(RateLimitConfig { capacity: 100.0, refill_rate: 1.0 }, clock.clone());
    let approvals = ApprovalStore::open(dir.path().join("Approvals")).unwrap();
    let nonces = NonceRegistry::open(dir.path().join("nonces.log")).unwrap();
    let audit = AuditLog::open(dir.path().join("Logs")).unwrap();
    let guard = ActionGuard::new(
        verifier,
        rate_limiter,
        CircuitBreakerConfig { failure_threshold: 2, failure_window: Duration::from_secs(60), open_timeout: Duration::from_secs(30), half_open_max_calls: 1 },
        approvals,
        nonces,
        audit,
        clock,
    );
    let binding = DriverBinding { binary_path: "/bin/false".into(), timeout: Duration::from_secs(5) };

    let _ = guard.execute("noop", "message", serde_json::json!({}), &binding, None).await;
    let _ = guard.execute("noop", "message", serde_json::json!({}), &binding, None).await;
    let err = guard.execute("noop", "message", serde_json::json!({}), &binding, None).await.unwrap_err();
    assert_eq!(err.label(), "circuit_open");
}
