// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Token-bucket rate limiting keyed by `(driver, action_type)`. Refill is
//! continuous rather than stepped: tokens owed since the last consume are
//! computed from elapsed wall-clock time, so bursts up to `capacity` are
//! allowed and idle buckets do not need a background ticker.

use parking_lot::Mutex;
use std::collections::HashMap;
use warden_core::Clock;

/// Per-key bucket configuration. `capacity` bounds burst size;
/// `refill_rate` is tokens added per second.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_rate: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { capacity: 10.0, refill_rate: 1.0 }
    }
}

struct Bucket {
    tokens: f64,
    last_refill: std::time::Instant,
}

/// `consume(key, n)` returns `Ok` if `n` tokens were available, or
/// `Throttled` without mutating state otherwise.
pub struct RateLimiter<C: Clock> {
    default_config: RateLimitConfig,
    overrides: HashMap<String, RateLimitConfig>,
    buckets: Mutex<HashMap<String, Bucket>>,
    clock: C,
}

impl<C: Clock> RateLimiter<C> {
    pub fn new(default_config: RateLimitConfig, clock: C) -> Self {
        Self { default_config, overrides: HashMap::new(), buckets: Mutex::new(HashMap::new()), clock }
    }

    pub fn with_override(mut self, key: impl Into<String>, config: RateLimitConfig) -> Self {
        self.overrides.insert(key.into(), config);
        self
    }

    fn config_for(&self, key: &str) -> RateLimitConfig {
        self.overrides.get(key).copied().unwrap_or(self.default_config)
    }

    /// Attempt to consume `n` tokens from the bucket for `key`. Returns
    /// `true` if admitted, `false` if throttled.
    pub fn consume(&self, key: &str, n: f64) -> bool {
        let config = self.config_for(key);
        let now = self.clock.now();
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket { tokens: config.capacity, last_refill: now });

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * config.refill_rate).min(config.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= n {
            bucket.tokens -= n;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "rate_limiter_tests.rs"]
mod tests;
