// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! The `wardend` configuration file: a single YAML document with every
//! knob named in §6 defaulted, loaded once at process start and layered
//! with `WARDEN_*` environment overrides the way `ferrex-config` layers
//! env over file config.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use warden_core::approval::ActionType;
use warden_guard::{CircuitBreakerConfig, DriverBinding, RateLimitConfig};
use warden_scheduler::{DriverRegistry, InvokerConfig, RetryConfig, SchedulerConfig};
use warden_vault::ScorerConfig;

/// A driver as named in `warden.yaml`'s `drivers` map: the binary
/// `ActionGuard` spawns once an action clears verification, and how long
/// it's allowed to run before being killed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverEntry {
    pub binary_path: PathBuf,
    pub timeout_secs: u64,
}

/// One driver/action-type rate limit entry from `warden.yaml`'s
/// `rate_limits` map, per §6. Converted to a token-bucket `RateLimitConfig`
/// by taking the more restrictive of the two stated rates; `per_minute`
/// also bounds burst capacity, since a bucket that could burst past its
/// own per-minute limit isn't really limiting it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitEntry {
    pub per_minute: f64,
    pub per_hour: f64,
}

impl RateLimitEntry {
    fn to_rate_limit_config(&self) -> RateLimitConfig {
        let refill_rate = (self.per_minute / 60.0).min(self.per_hour / 3600.0);
        RateLimitConfig { capacity: self.per_minute, refill_rate }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: serde_yaml::Error },
    #[error("invalid environment override {var}: {value}")]
    BadEnvOverride { var: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vault_root: PathBuf,
    pub reasoning_command: Vec<String>,
    pub reasoning_timeout_secs: u64,
    pub reasoning_grace_period_ms: u64,
    pub max_concurrent_tasks: usize,
    pub poll_interval_secs: u64,
    pub approval_poll_interval_secs: u64,
    pub pause_approval_timeouts_on_stop_hook: bool,
    /// Per-action-type approver gate, per §4.H/§6: `authorized_approvers[action_type]`.
    pub authorized_approvers: HashMap<ActionType, Vec<String>>,
    /// Per-action-type approval TTL overrides (seconds), per §6. Falls
    /// back to `ActionType::default_ttl()` when an action type is absent.
    pub approval_timeouts: HashMap<ActionType, u64>,
    /// Per-driver, per-action-type rate limit overrides, per §6's
    /// `rate_limits {driver -> {action_type -> {per_minute, per_hour}}}`.
    /// Action types absent here fall back to the driver/global default.
    pub rate_limits: HashMap<String, HashMap<ActionType, RateLimitEntry>>,
    pub credential_use_keyring: bool,
    pub credential_service_prefix: String,
    pub rate_limit_capacity: f64,
    pub rate_limit_refill_per_sec: f64,
    pub circuit_failure_threshold: u32,
    pub circuit_failure_window_secs: u64,
    pub circuit_open_timeout_secs: u64,
    pub circuit_half_open_max_calls: u32,
    pub retry_max_attempts: u32,
    pub retry_delays_secs: Vec<u64>,
    pub scorer_weight_urgency: f64,
    pub scorer_weight_deadline: f64,
    pub scorer_weight_sender: f64,
    pub scorer_vip_senders: Vec<String>,
    pub scorer_client_senders: Vec<String>,
    pub scorer_internal_domains: Vec<String>,
    pub drivers: HashMap<String, DriverEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_root: PathBuf::from("."),
            reasoning_command: vec!["warden-reasoner".to_string()],
            reasoning_timeout_secs: 300,
            reasoning_grace_period_ms: 5_000,
            max_concurrent_tasks: 2,
            poll_interval_secs: 30,
            approval_poll_interval_secs: 2,
            pause_approval_timeouts_on_stop_hook: false,
            authorized_approvers: HashMap::new(),
            approval_timeouts: HashMap::new(),
            rate_limits: HashMap::new(),
            credential_use_keyring: true,
            credential_service_prefix: "warden".to_string(),
            rate_limit_capacity: 10.0,
            rate_limit_refill_per_sec: 1.0,
            circuit_failure_threshold: 5,
            circuit_failure_window_secs: 60,
            circuit_open_timeout_secs: 30,
            circuit_half_open_max_calls: 1,
            retry_max_attempts: 5,
            retry_delays_secs: vec![60, 300, 900, 3600, 14_400],
            scorer_weight_urgency: 0.4,
            scorer_weight_deadline: 0.3,
            scorer_weight_sender: 0.3,
            scorer_vip_senders: Vec::new(),
            scorer_client_senders: Vec::new(),
            scorer_internal_domains: Vec::new(),
            drivers: HashMap::new(),
        }
    }
}

impl Config {
    /// Load from `path` if it exists, falling back to defaults if it
    /// doesn't, then apply `WARDEN_*` environment overrides. A config
    /// file that exists but fails to parse is a hard error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
            serde_yaml::from_str(&text)
                .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(root) = std::env::var("WARDEN_VAULT_ROOT") {
            self.vault_root = PathBuf::from(root);
        }
        if let Ok(value) = std::env::var("WARDEN_MAX_CONCURRENT_TASKS") {
            self.max_concurrent_tasks = value
                .parse()
                .map_err(|_| ConfigError::BadEnvOverride { var: "WARDEN_MAX_CONCURRENT_TASKS", value })?;
        }
        if let Ok(value) = std::env::var("WARDEN_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = value
                .parse()
                .map_err(|_| ConfigError::BadEnvOverride { var: "WARDEN_POLL_INTERVAL_SECS", value })?;
        }
        if let Ok(value) = std::env::var("WARDEN_PAUSE_APPROVAL_TIMEOUTS_ON_STOP_HOOK") {
            self.pause_approval_timeouts_on_stop_hook = value
                .parse()
                .map_err(|_| ConfigError::BadEnvOverride {
                    var: "WARDEN_PAUSE_APPROVAL_TIMEOUTS_ON_STOP_HOOK",
                    value,
                })?;
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            vault_root: self.vault_root.clone(),
            max_concurrent_tasks: self.max_concurrent_tasks,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            approval_poll_interval: Duration::from_secs(self.approval_poll_interval_secs),
            max_iterations: None,
        }
    }

    pub fn invoker_config(&self) -> InvokerConfig {
        InvokerConfig {
            command: self.reasoning_command.clone(),
            vault_root: self.vault_root.clone(),
            logs_dir: self.vault_root.join("Logs").join("reasoning"),
            timeout: Duration::from_secs(self.reasoning_timeout_secs),
            grace_period: Duration::from_millis(self.reasoning_grace_period_ms),
            approval_timeouts: self
                .approval_timeouts
                .iter()
                .map(|(action_type, secs)| (action_type.as_str().to_string(), *secs as i64))
                .collect(),
        }
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig { capacity: self.rate_limit_capacity, refill_rate: self.rate_limit_refill_per_sec }
    }

    /// Build a `RateLimiter` seeded with the global default plus every
    /// `rate_limits` override, keyed `"{driver}:{action_type}"` to match
    /// `ActionGuard::execute`'s bucket key.
    pub fn rate_limiter<C: warden_core::Clock>(&self, clock: C) -> warden_guard::RateLimiter<C> {
        let mut limiter = warden_guard::RateLimiter::new(self.rate_limit_config(), clock);
        for (driver, by_action) in &self.rate_limits {
            for (action_type, entry) in by_action {
                limiter = limiter.with_override(format!("{driver}:{action_type}"), entry.to_rate_limit_config());
            }
        }
        limiter
    }

    /// The approval TTL for `action_type`: the `approval_timeouts`
    /// override if configured, else the action type's own default.
    pub fn approval_ttl(&self, action_type: &ActionType) -> chrono::Duration {
        self.approval_timeouts
            .get(action_type)
            .map(|secs| chrono::Duration::seconds(*secs as i64))
            .unwrap_or_else(|| action_type.default_ttl())
    }

    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.circuit_failure_threshold,
            failure_window: Duration::from_secs(self.circuit_failure_window_secs),
            open_timeout: Duration::from_secs(self.circuit_open_timeout_secs),
            half_open_max_calls: self.circuit_half_open_max_calls,
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_max_attempts,
            delays: self.retry_delays_secs.iter().copied().map(Duration::from_secs).collect(),
        }
    }

    pub fn scorer_config(&self) -> ScorerConfig {
        ScorerConfig {
            w_urgency: self.scorer_weight_urgency,
            w_deadline: self.scorer_weight_deadline,
            w_sender: self.scorer_weight_sender,
            vip_senders: self.scorer_vip_senders.clone(),
            client_senders: self.scorer_client_senders.clone(),
            internal_domains: self.scorer_internal_domains.clone(),
        }
    }

    pub fn driver_registry(&self) -> DriverRegistry {
        let mut registry = DriverRegistry::new();
        for (name, entry) in &self.drivers {
            registry.register(
                name.clone(),
                DriverBinding { binary_path: entry.binary_path.clone(), timeout: Duration::from_secs(entry.timeout_secs) },
            );
        }
        registry
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
