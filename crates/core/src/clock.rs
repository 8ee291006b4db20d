// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Clock abstraction for testable time handling.
//!
//! Every component that reasons about time (the priority scorer's age
//! boost, approval expiry, rate-limiter refill, circuit-breaker windows)
//! takes a `Clock` rather than calling `Instant::now()`/`Utc::now()`
//! directly, so tests can advance time deterministically instead of
//! sleeping.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A clock that provides the current time, both monotonic and wall-clock.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    instant: Arc<Mutex<Instant>>,
    utc: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            instant: Arc::new(Mutex::new(Instant::now())),
            utc: Arc::new(Mutex::new(Utc::now())),
        }
    }

    pub fn at(utc: DateTime<Utc>) -> Self {
        let clock = Self::new();
        *clock.utc.lock() = utc;
        clock
    }

    /// Advance both the monotonic and wall clocks by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.instant.lock() += duration;
        if let Ok(chrono_duration) = chrono::Duration::from_std(duration) {
            *self.utc.lock() += chrono_duration;
        }
    }

    pub fn set_utc(&self, utc: DateTime<Utc>) {
        *self.utc.lock() = utc;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.instant.lock()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        *self.utc.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
