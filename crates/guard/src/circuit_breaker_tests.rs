// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;
use warden_core::FakeClock;

fn config() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold: 3,
        failure_window: Duration::from_secs(60),
        open_timeout: Duration::from_secs(10),
        half_open_max_calls: 1,
    }
}

#[test]
fn opens_after_failure_threshold_within_window() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new(config(), clock);

    breaker.report_failure();
    breaker.report_failure();
    assert_eq!(breaker.state(), CircuitState::Closed);
    breaker.report_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
    assert!(!breaker.allow());
}

#[test]
fn old_failures_outside_the_window_do_not_count() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new(config(), clock.clone());

    breaker.report_failure();
    clock.advance(Duration::from_secs(120));
    breaker.report_failure();
    breaker.report_failure();
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn transitions_to_half_open_after_timeout_and_closes_on_success() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new(config(), clock.clone());

    breaker.report_failure();
    breaker.report_failure();
    breaker.report_failure();
    assert_eq!(breaker.state(), CircuitState::Open);

    clock.advance(Duration::from_secs(11));
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert!(breaker.allow());
    breaker.report_success();
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn a_failed_probe_in_half_open_reopens_the_circuit() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new(config(), clock.clone());

    breaker.report_failure();
    breaker.report_failure();
    breaker.report_failure();
    clock.advance(Duration::from_secs(11));
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert!(breaker.allow());
    breaker.report_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[test]
fn half_open_admits_only_up_to_max_calls() {
    let clock = FakeClock::new();
    let mut cfg = config();
    cfg.half_open_max_calls = 2;
    let breaker = CircuitBreaker::new(cfg, clock.clone());

    breaker.report_failure();
    breaker.report_failure();
    breaker.report_failure();
    clock.advance(Duration::from_secs(11));

    assert!(breaker.allow());
    assert!(breaker.allow());
    assert!(!breaker.allow());
}

#[test]
fn manual_reset_forces_closed() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new(config(), clock);
    breaker.report_failure();
    breaker.report_failure();
    breaker.report_failure();
    assert_eq!(breaker.state(), CircuitState::Open);

    breaker.reset();
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert!(breaker.allow());
}
