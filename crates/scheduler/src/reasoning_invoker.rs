// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Launches the reasoning subprocess for one task: a minimal environment,
//! streamed stdout/stderr capture to a per-task log file, graceful
//! termination on timeout followed by a force-kill, and a post-exit scan
//! of `Plans/` and `Approvals/` for artifacts the subprocess produced.
//! The invoker never performs a state transition itself.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex as SyncMutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use warden_core::{Approval, Task, TraceId, VaultError};
use warden_storage::ApprovalStore;

#[derive(Debug, Clone)]
pub struct InvokerConfig {
    pub command: Vec<String>,
    pub vault_root: PathBuf,
    pub logs_dir: PathBuf,
    pub timeout: Duration,
    pub grace_period: Duration,
    /// Per-action-type approval TTL overrides (seconds), keyed by
    /// `ActionType::as_str()`, handed to the subprocess as JSON so it can
    /// size the `expires_at` it stamps on approvals it writes — the
    /// subprocess owns approval creation per §6, so this is the only path
    /// for `Config.approval_timeouts` to reach it.
    pub approval_timeouts: std::collections::HashMap<String, i64>,
}

/// What the reasoning subprocess produced for one task.
#[derive(Debug, Clone)]
pub struct ReasoningOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub produced_approvals: Vec<Approval>,
    pub produced_plans: Vec<PathBuf>,
}

pub struct ReasoningInvoker {
    config: InvokerConfig,
    approvals: ApprovalStore,
}

impl ReasoningInvoker {
    pub fn new(config: InvokerConfig, approvals: ApprovalStore) -> Self {
        Self { config, approvals }
    }

    pub async fn invoke(&self, task: &Task, trace_id: TraceId) -> Result<ReasoningOutcome, VaultError> {
        let Some((program, args)) = self.config.command.split_first() else {
            return Err(VaultError::ReasoningCrashed { detail: "reasoning command is empty".to_string() });
        };

        let log_path = self.config.logs_dir.join(format!("{}.log", task.task_id));
        if let Some(parent) = log_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| VaultError::FileSystemError {
                message: format!("{}: {e}", parent.display()),
            })?;
        }
        let log_file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .await
            .map_err(|e| VaultError::FileSystemError { message: format!("{}: {e}", log_path.display()) })?;
        let log_file = Arc::new(tokio::sync::Mutex::new(log_file));

        let mut command = Command::new(program);
        command
            .args(args)
            .env_clear()
            .env("VAULT_ROOT", &self.config.vault_root)
            .env("TRACE_ID", trace_id.to_string())
            .env("TASK_ID", task.task_id.to_string())
            .env(
                "APPROVAL_TIMEOUTS_JSON",
                serde_json::to_string(&self.config.approval_timeouts).unwrap_or_else(|_| "{}".to_string()),
            )
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = command.spawn().map_err(|e| VaultError::ReasoningCrashed { detail: e.to_string() })?;
        let pid = child.id();

        let stdout_buf = Arc::new(SyncMutex::new(String::new()));
        let stderr_buf = Arc::new(SyncMutex::new(String::new()));

        let stdout_task = child
            .stdout
            .take()
            .map(|stdout| tokio::spawn(stream_to_log(stdout, log_file.clone(), "stdout", stdout_buf.clone())));
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(stream_to_log(stderr, log_file.clone(), "stderr", stderr_buf.clone())));

        let exit_status = tokio::select! {
            status = child.wait() => status.map_err(|e| VaultError::ReasoningCrashed { detail: e.to_string() })?,
            _ = tokio::time::sleep(self.config.timeout) => {
                self.terminate(pid, &mut child).await;
                if let Some(task) = stdout_task { task.abort(); }
                if let Some(task) = stderr_task { task.abort(); }
                return Err(VaultError::ReasoningTimeout { elapsed_secs: self.config.timeout.as_secs() });
            }
        };

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        let outcome = self.discover_artifacts(task, exit_status.code().unwrap_or(-1), &stdout_buf, &stderr_buf)?;
        Ok(outcome)
    }

    async fn terminate(&self, pid: Option<u32>, child: &mut tokio::process::Child) {
        if let Some(pid) = pid {
            let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        }
        let graceful = tokio::time::timeout(self.config.grace_period, child.wait()).await;
        if graceful.is_err() {
            let _ = child.kill().await;
        }
    }

    fn discover_artifacts(
        &self,
        task: &Task,
        exit_code: i32,
        stdout_buf: &SyncMutex<String>,
        stderr_buf: &SyncMutex<String>,
    ) -> Result<ReasoningOutcome, VaultError> {
        let produced_approvals = self.approvals.list_for_task(&task.task_id).map_err(VaultError::from)?;

        let plans_dir = self.config.vault_root.join("Plans");
        let mut produced_plans = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&plans_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("md") {
                    continue;
                }
                if let Ok(contents) = std::fs::read_to_string(&path) {
                    if contents.contains(task.task_id.as_str()) {
                        produced_plans.push(path);
                    }
                }
            }
        }

        Ok(ReasoningOutcome {
            exit_code,
            stdout: stdout_buf.lock().clone(),
            stderr: stderr_buf.lock().clone(),
            produced_approvals,
            produced_plans,
        })
    }
}

async fn stream_to_log<R>(
    reader: R,
    log_file: Arc<tokio::sync::Mutex<tokio::fs::File>>,
    stream_name: &'static str,
    buf: Arc<SyncMutex<String>>,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                buf.lock().push_str(&line);
                buf.lock().push('\n');
                let mut file = log_file.lock().await;
                let _ = file.write_all(format!("[{stream_name}] {line}\n").as_bytes()).await;
            }
            Ok(None) => break,
            Err(_) => break,
        }
    }
}

#[cfg(test)]
#[path = "reasoning_invoker_tests.rs"]
mod tests;
