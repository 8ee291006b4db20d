// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Plain counters, coarse latency summaries, and a liveness check —
//! no metrics crate, matching the rest of this domain's preference for
//! hand-rolled state over a dependency with a single consumer.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;

const COUNTER_NAMES: &[&str] = &[
    "tasks_discovered",
    "tasks_completed",
    "tasks_failed",
    "retries",
    "approvals_created",
    "approvals_approved",
    "approvals_rejected",
    "approvals_timed_out",
    "driver_invocations",
    "driver_failures",
    "rate_limited",
    "circuit_trips",
    "secrets_scanned",
    "secrets_found",
];

const HISTOGRAM_NAMES: &[&str] = &["reasoning_duration", "approval_wait", "action_duration", "end_to_end"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Snapshot of everything `Health` is computed from, supplied by the
/// scheduler's own view of the world rather than tracked here — this
/// type has no way to observe circuit state or checkpoint success on
/// its own.
#[derive(Debug, Clone, Copy)]
pub struct HealthInputs {
    pub any_circuit_open: bool,
    pub last_completion: Option<DateTime<Utc>>,
    pub checkpoint_save_succeeding: bool,
}

#[derive(Default)]
struct Histogram {
    samples_ms: Vec<u64>,
}

impl Histogram {
    fn record(&mut self, d: Duration) {
        self.samples_ms.push(d.as_millis() as u64);
    }

    fn summary(&self) -> HistogramSummary {
        if self.samples_ms.is_empty() {
            return HistogramSummary::default();
        }
        let mut sorted = self.samples_ms.clone();
        sorted.sort_unstable();
        let sum: u64 = sorted.iter().sum();
        let p50 = percentile(&sorted, 0.50);
        let p95 = percentile(&sorted, 0.95);
        let p99 = percentile(&sorted, 0.99);
        HistogramSummary {
            count: sorted.len() as u64,
            mean_ms: sum / sorted.len() as u64,
            p50_ms: p50,
            p95_ms: p95,
            p99_ms: p99,
        }
    }
}

fn percentile(sorted: &[u64], p: f64) -> u64 {
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistogramSummary {
    pub count: u64,
    pub mean_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
}

struct Inner {
    counters: BTreeMap<&'static str, u64>,
    histograms: BTreeMap<&'static str, Histogram>,
    window_started: DateTime<Utc>,
    window_errors: u64,
    window_total: u64,
}

/// Shared, lock-guarded counter and histogram registry for one scheduler
/// process. Cheap to clone (internally an `Arc`-free `Mutex` wrapper —
/// callers hold one instance and share references).
pub struct Metrics {
    inner: Mutex<Inner>,
}

impl Metrics {
    pub fn new(now: DateTime<Utc>) -> Self {
        let counters = COUNTER_NAMES.iter().map(|&name| (name, 0u64)).collect();
        let histograms = HISTOGRAM_NAMES.iter().map(|&name| (name, Histogram::default())).collect();
        Self {
            inner: Mutex::new(Inner { counters, histograms, window_started: now, window_errors: 0, window_total: 0 }),
        }
    }

    /// Increment a named counter. Panics in debug builds on an unknown
    /// name to catch a typo at the call site; release builds ignore it.
    pub fn incr(&self, counter: &str) {
        let mut inner = self.inner.lock();
        if let Some(v) = inner.counters.get_mut(counter) {
            *v += 1;
        } else {
            debug_assert!(false, "unknown counter: {counter}");
        }
    }

    pub fn observe(&self, histogram: &str, duration: Duration) {
        let mut inner = self.inner.lock();
        if let Some(h) = inner.histograms.get_mut(histogram) {
            h.record(duration);
        } else {
            debug_assert!(false, "unknown histogram: {histogram}");
        }
    }

    /// Record one task outcome into the rolling hourly error-rate window,
    /// resetting the window once it has aged past an hour.
    pub fn record_outcome(&self, now: DateTime<Utc>, is_error: bool) {
        let mut inner = self.inner.lock();
        if now - inner.window_started > chrono::Duration::hours(1) {
            inner.window_started = now;
            inner.window_errors = 0;
            inner.window_total = 0;
        }
        inner.window_total += 1;
        if is_error {
            inner.window_errors += 1;
        }
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.inner.lock().counters.get(name).copied().unwrap_or(0)
    }

    pub fn histogram(&self, name: &str) -> HistogramSummary {
        self.inner.lock().histograms.get(name).map(Histogram::summary).unwrap_or_default()
    }

    fn hourly_error_rate(&self) -> f64 {
        let inner = self.inner.lock();
        if inner.window_total == 0 {
            0.0
        } else {
            inner.window_errors as f64 / inner.window_total as f64
        }
    }

    pub fn health(&self, now: DateTime<Utc>, inputs: HealthInputs) -> Health {
        if inputs.any_circuit_open || !inputs.checkpoint_save_succeeding {
            return Health::Unhealthy;
        }
        let stale = inputs
            .last_completion
            .is_none_or(|last| now - last > chrono::Duration::hours(1));
        let error_rate = self.hourly_error_rate();
        if stale || error_rate >= 0.10 {
            return Health::Degraded;
        }
        Health::Healthy
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
