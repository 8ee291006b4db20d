// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! The composite action gate: every side-effecting driver call passes
//! through `ActionGuard::execute`, which chains redaction, driver trust
//! verification, rate limiting, circuit breaking, and nonce-guarded
//! approval consumption before the driver subprocess ever runs.

use crate::circuit_breaker::CircuitBreaker;
use crate::driver_verifier::DriverVerifier;
use crate::rate_limiter::RateLimiter;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use warden_core::{ApprovalId, ApprovalStatus, AuditEvent, AuditLevel, AuditOutcome, Clock, TraceId, VaultError};
use warden_storage::{ApprovalStore, AuditLog, NonceRegistry};

/// One driver's on-disk binary and invocation timeout, resolved by the
/// caller before dispatch.
pub struct DriverBinding {
    pub binary_path: PathBuf,
    pub timeout: Duration,
}

/// Result of a driver invocation that actually ran to completion (spawn
/// and I/O succeeded; the driver itself may still have failed).
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    /// Parsed from stdout's `{ok, detail?}` JSON result, when stdout
    /// parses as one. `None` when the driver didn't emit the documented
    /// shape, in which case only the exit code decides success.
    pub ok: Option<bool>,
    pub detail: Option<String>,
}

/// The documented stdout contract: `{ok: bool, detail?: string}`.
#[derive(Debug, Clone, serde::Deserialize)]
struct DriverReport {
    ok: bool,
    #[serde(default)]
    detail: Option<String>,
}

pub struct ActionGuard<C: Clock> {
    verifier: DriverVerifier,
    rate_limiter: RateLimiter<C>,
    circuits: parking_lot::Mutex<std::collections::HashMap<String, std::sync::Arc<CircuitBreaker<C>>>>,
    circuit_config: crate::circuit_breaker::CircuitBreakerConfig,
    approvals: ApprovalStore,
    nonces: NonceRegistry,
    audit: AuditLog,
    clock: C,
}

impl<C: Clock> ActionGuard<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        verifier: DriverVerifier,
        rate_limiter: RateLimiter<C>,
        circuit_config: crate::circuit_breaker::CircuitBreakerConfig,
        approvals: ApprovalStore,
        nonces: NonceRegistry,
        audit: AuditLog,
        clock: C,
    ) -> Self {
        Self {
            verifier,
            rate_limiter,
            circuits: parking_lot::Mutex::new(std::collections::HashMap::new()),
            circuit_config,
            approvals,
            nonces,
            audit,
            clock,
        }
    }

    /// Whether any driver's circuit is currently open, for health checks.
    pub fn any_circuit_open(&self) -> bool {
        self.circuits
            .lock()
            .values()
            .any(|c| c.state() == crate::circuit_breaker::CircuitState::Open)
    }

    fn circuit_for(&self, driver: &str) -> std::sync::Arc<CircuitBreaker<C>> {
        let mut circuits = self.circuits.lock();
        circuits
            .entry(driver.to_string())
            .or_insert_with(|| std::sync::Arc::new(CircuitBreaker::new(self.circuit_config, self.clock.clone())))
            .clone()
    }

    fn emit(
        &self,
        event_type: &str,
        trace_id: TraceId,
        driver: &str,
        action_type: &str,
        outcome: AuditOutcome,
        duration_ms: Option<u64>,
        context: BTreeMap<String, String>,
    ) {
        let event = AuditEvent {
            ts: Utc::now(),
            trace_id,
            level: if outcome == AuditOutcome::Ok { AuditLevel::Info } else { AuditLevel::Warn },
            event_type: event_type.to_string(),
            actor: "action_guard".to_string(),
            task_id: None,
            approval_id: None,
            driver: Some(driver.to_string()),
            action_type: Some(action_type.to_string()),
            outcome,
            duration_ms,
            redacted_context: context,
        };
        if let Err(e) = self.audit.append(&event) {
            tracing::error!(error = %e, "failed to audit action guard event");
        }
    }

    /// Execute one driver call, enforcing every §4.G gate in order.
    /// `approval_ref` is `Some` when this action type requires a
    /// pre-approved, unconsumed nonce.
    pub async fn execute(
        &self,
        driver_name: &str,
        action_type: &str,
        payload: serde_json::Value,
        binding: &DriverBinding,
        approval_ref: Option<ApprovalId>,
    ) -> Result<ActionOutcome, VaultError> {
        let trace_id = TraceId::new();
        let redacted_payload = warden_secrets::redact(&payload.to_string());

        // D: driver trust verification.
        if let Err(e) = self.verifier.verify(driver_name, &binding.binary_path) {
            self.emit(
                "driver.verification_failed",
                trace_id,
                driver_name,
                action_type,
                AuditOutcome::Err,
                None,
                BTreeMap::new(),
            );
            return Err(e.into());
        }

        // E: rate limiting.
        let bucket_key = format!("{driver_name}:{action_type}");
        if !self.rate_limiter.consume(&bucket_key, 1.0) {
            self.emit(
                "rate_limited",
                trace_id,
                driver_name,
                action_type,
                AuditOutcome::Err,
                None,
                BTreeMap::new(),
            );
            return Err(VaultError::Throttled { driver: driver_name.to_string(), action_type: action_type.to_string() });
        }

        // F: circuit breaker.
        let circuit = self.circuit_for(driver_name);
        if !circuit.allow() {
            self.emit(
                "circuit_open",
                trace_id,
                driver_name,
                action_type,
                AuditOutcome::Err,
                None,
                BTreeMap::new(),
            );
            return Err(VaultError::CircuitOpen { driver: driver_name.to_string() });
        }

        // H + nonce: approval and replay-protection gate.
        if let Some(approval_id) = &approval_ref {
            let approval = self.approvals.load(approval_id).map_err(VaultError::from)?;
            if approval.status != ApprovalStatus::Approved {
                return Err(VaultError::ApprovalInvalid { reason: "action has no approved approval".to_string() });
            }
            let fresh = self.nonces.consume(&approval.nonce).map_err(VaultError::from)?;
            if !fresh {
                return Err(VaultError::NonceReused { approval_id: approval_id.to_string() });
            }
        }

        // Invoke the driver subprocess, enforcing the bound timeout.
        let start = std::time::Instant::now();
        let spawned = run_with_timeout(&binding.binary_path, &payload, binding.timeout).await;
        let duration = start.elapsed();

        // Combine spawn/I-O failures and the driver's own exit code + `ok`
        // report into one classification, per the §7 DriverFailure taxonomy:
        // a conservative default of retryable, since no per-driver exit-code
        // signal is configured.
        let classified = spawned.and_then(|o| {
            if o.exit_code == 0 && o.ok.unwrap_or(true) {
                Ok(o)
            } else {
                let message = o.detail.clone().unwrap_or_else(|| format!("exit code {}", o.exit_code));
                Err(message)
            }
        });

        let outcome = if classified.is_ok() { AuditOutcome::Ok } else { AuditOutcome::Err };
        if outcome == AuditOutcome::Ok {
            circuit.report_success();
        } else {
            circuit.report_failure();
        }

        let mut context = BTreeMap::new();
        context.insert("payload".to_string(), redacted_payload);
        self.emit(
            "action.executed",
            trace_id,
            driver_name,
            action_type,
            outcome,
            Some(duration.as_millis() as u64),
            context,
        );

        classified.map_err(|e| VaultError::DriverFailure {
            driver: driver_name.to_string(),
            message: e,
            retryable: true,
        })
    }
}

async fn run_with_timeout(
    binary_path: &std::path::Path,
    payload: &serde_json::Value,
    timeout: Duration,
) -> Result<ActionOutcome, String> {
    use tokio::io::AsyncWriteExt;

    let payload_json = serde_json::to_vec(payload).map_err(|e| e.to_string())?;
    let mut command = tokio::process::Command::new(binary_path);
    command.stdin(std::process::Stdio::piped());
    command.stdout(std::process::Stdio::piped());
    command.stderr(std::process::Stdio::piped());

    let start = std::time::Instant::now();
    let mut child = command.spawn().map_err(|e| e.to_string())?;
    let mut stdin = child.stdin.take().ok_or_else(|| "driver stdin was not piped".to_string())?;

    let output = match tokio::time::timeout(timeout, async {
        stdin.write_all(&payload_json).await?;
        drop(stdin);
        child.wait_with_output().await
    })
    .await
    {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(e.to_string()),
        Err(_) => return Err(format!("driver timed out after {timeout:?}")),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let report = serde_json::from_str::<DriverReport>(stdout.trim()).ok();

    Ok(ActionOutcome {
        exit_code: output.status.code().unwrap_or(-1),
        stdout,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration: start.elapsed(),
        ok: report.as_ref().map(|r| r.ok),
        detail: report.and_then(|r| r.detail),
    })
}

#[cfg(test)]
#[path = "action_guard_tests.rs"]
mod tests;
