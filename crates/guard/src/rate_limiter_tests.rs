// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;
use std::time::Duration;
use warden_core::FakeClock;

#[test]
fn consumes_up_to_capacity_then_throttles() {
    let clock = FakeClock::new();
    let limiter = RateLimiter::new(RateLimitConfig { capacity: 3.0, refill_rate: 1.0 }, clock);

    assert!(limiter.consume("driver:payment", 1.0));
    assert!(limiter.consume("driver:payment", 1.0));
    assert!(limiter.consume("driver:payment", 1.0));
    assert!(!limiter.consume("driver:payment", 1.0));
}

#[test]
fn tokens_refill_continuously_over_elapsed_time() {
    let clock = FakeClock::new();
    let limiter = RateLimiter::new(RateLimitConfig { capacity: 2.0, refill_rate: 1.0 }, clock.clone());

    assert!(limiter.consume("k", 2.0));
    assert!(!limiter.consume("k", 1.0));

    clock.advance(Duration::from_secs(1));
    assert!(limiter.consume("k", 1.0));
}

#[test]
fn distinct_keys_have_independent_buckets() {
    let clock = FakeClock::new();
    let limiter = RateLimiter::new(RateLimitConfig { capacity: 1.0, refill_rate: 0.0 }, clock);

    assert!(limiter.consume("a", 1.0));
    assert!(limiter.consume("b", 1.0));
    assert!(!limiter.consume("a", 1.0));
}

#[test]
fn per_key_override_replaces_the_default_config() {
    let clock = FakeClock::new();
    let limiter = RateLimiter::new(RateLimitConfig { capacity: 1.0, refill_rate: 0.0 }, clock)
        .with_override("vip", RateLimitConfig { capacity: 5.0, refill_rate: 0.0 });

    for _ in 0..5 {
        assert!(limiter.consume("vip", 1.0));
    }
    assert!(!limiter.consume("vip", 1.0));
}
