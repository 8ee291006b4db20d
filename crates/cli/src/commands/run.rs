// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! `wardend run` — assemble every component and drive the Ralph Wiggum
//! Loop until SIGINT/SIGTERM, mirroring the teacher daemon's own
//! signal-driven shutdown sequence.

use crate::config::Config;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warden_core::{Clock, SystemClock};
use warden_guard::{ActionGuard, DriverVerifier};
use warden_scheduler::{PersistenceRetryLoop, ReasoningInvoker, Scheduler};
use warden_storage::{AuditLog, Checkpointer, NonceRegistry};
use warden_vault::{PriorityScorer, VaultStateMachine};

pub async fn handle(config: Config, trust_store_path: std::path::PathBuf, checkpoint_path: std::path::PathBuf) -> Result<()> {
    let clock = SystemClock;
    let vault_root = config.vault_root.clone();

    let vault = VaultStateMachine::open(&vault_root, AuditLog::open(vault_root.join("Logs")).context("opening audit log")?);
    let approvals = warden_storage::ApprovalStore::open(vault_root.join("Approvals")).context("opening approval store")?;
    let invoker = ReasoningInvoker::new(
        config.invoker_config(),
        warden_storage::ApprovalStore::open(vault_root.join("Approvals")).context("opening approval store")?,
    );

    let verifier = DriverVerifier::open(&trust_store_path);
    let rate_limiter = config.rate_limiter(clock.clone());
    let nonces = NonceRegistry::open(vault_root.join("nonces.log")).context("opening nonce registry")?;
    let guard = Arc::new(ActionGuard::new(
        verifier,
        rate_limiter,
        config.circuit_breaker_config(),
        warden_storage::ApprovalStore::open(vault_root.join("Approvals")).context("opening approval store")?,
        nonces,
        AuditLog::open(vault_root.join("Logs")).context("opening audit log")?,
        clock.clone(),
    ));

    let retry = PersistenceRetryLoop::new(
        VaultStateMachine::open(&vault_root, AuditLog::open(vault_root.join("Logs")).context("opening audit log")?),
        Checkpointer::new(&checkpoint_path),
        AuditLog::open(vault_root.join("Logs")).context("opening audit log")?,
        config.retry_config(),
    );

    let drivers = config.driver_registry();

    let scheduler = Arc::new(Scheduler::new(
        config.scheduler_config(),
        vault,
        invoker,
        approvals,
        guard,
        retry,
        Checkpointer::new(&checkpoint_path),
        Arc::new(warden_scheduler::Metrics::new(clock.now_utc())),
        PriorityScorer::new(config.scorer_config()),
        drivers,
        clock,
    ));

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutdown signal received, draining in-flight tasks");
        shutdown.cancel();
    });

    scheduler.run(cancel).await.context("scheduler loop exited with an error")
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let (sigterm, sigint) = (signal(SignalKind::terminate()), signal(SignalKind::interrupt()));
    match (sigterm, sigint) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = sigint.recv() => {}
            }
        }
        _ => {
            tracing::error!("failed to install signal handlers; falling back to ctrl-c only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
