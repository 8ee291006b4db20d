// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Pure task priority scoring: same frontmatter and wall clock always
//! yield the same score, so the scheduler's queue order never depends
//! on anything but what is already on disk.

use chrono::{DateTime, Utc};
use warden_core::{Priority, Task};

/// Subject keywords checked in precedence order; the first match wins.
const URGENCY_KEYWORDS: &[(&str, u8)] =
    &[("urgent", 5), ("asap", 4), ("high", 4), ("normal", 3), ("low", 2), ("whenever", 1)];

#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub w_urgency: f64,
    pub w_deadline: f64,
    pub w_sender: f64,
    pub vip_senders: Vec<String>,
    pub client_senders: Vec<String>,
    pub internal_domains: Vec<String>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            w_urgency: 0.4,
            w_deadline: 0.3,
            w_sender: 0.3,
            vip_senders: Vec::new(),
            client_senders: Vec::new(),
            internal_domains: Vec::new(),
        }
    }
}

/// Computes `score(task) -> [0, inf)` per the configured weights.
pub struct PriorityScorer {
    config: ScorerConfig,
}

impl PriorityScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, task: &Task, now: DateTime<Utc>) -> f64 {
        let c = &self.config;
        c.w_urgency * f64::from(urgency(task))
            + c.w_deadline * f64::from(deadline(task, now))
            + c.w_sender * f64::from(self.sender(task))
            + age_boost(task, now)
    }

    fn sender(&self, task: &Task) -> u8 {
        let Some(sender) = &task.sender else {
            return 1;
        };
        let sender = sender.to_lowercase();
        if self.config.vip_senders.iter().any(|v| v.to_lowercase() == sender) {
            return 5;
        }
        if self.config.client_senders.iter().any(|c| c.to_lowercase() == sender) {
            return 4;
        }
        let domain = sender.rsplit('@').next().unwrap_or("");
        if self.config.internal_domains.iter().any(|d| d.to_lowercase() == domain) {
            return 3;
        }
        2
    }
}

fn urgency(task: &Task) -> u8 {
    let subject = task.subject.to_lowercase();
    for (keyword, score) in URGENCY_KEYWORDS {
        if subject.contains(keyword) {
            return *score;
        }
    }
    match task.priority {
        Priority::High => 4,
        Priority::Medium => 3,
        Priority::Low => 2,
    }
}

fn deadline(task: &Task, now: DateTime<Utc>) -> u8 {
    let Some(deadline) = task.deadline else {
        return 1;
    };
    let remaining = deadline - now;
    if remaining < chrono::Duration::hours(2) {
        5
    } else if remaining < chrono::Duration::hours(24) {
        4
    } else if remaining < chrono::Duration::hours(72) {
        3
    } else if remaining < chrono::Duration::days(7) {
        2
    } else {
        1
    }
}

fn age_boost(task: &Task, now: DateTime<Utc>) -> f64 {
    let age_hours = (now - task.created_at).num_seconds() as f64 / 3600.0;
    (age_hours / 24.0).max(0.0).min(2.0)
}

#[cfg(test)]
#[path = "priority_scorer_tests.rs"]
mod tests;
