// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! The Ralph Wiggum Loop: a discovery poll over `Needs_Action/`, a
//! priority queue ordering ready tasks by [`PriorityScorer`], and a
//! bounded worker pool that drives each task through plan → approval →
//! action → terminal. Cancellable via a `.stop_hook` file, an explicit
//! `CancellationToken`, or a configured iteration cap.

use crate::driver_registry::DriverRegistry;
use crate::metrics::{HealthInputs, Metrics};
use crate::reasoning_invoker::ReasoningInvoker;
use crate::retry_loop::PersistenceRetryLoop;
use chrono::Utc;
use notify::Watcher;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use warden_core::{ApprovalId, ApprovalStatus, Clock, Task, TraceId, VaultError, WorkflowFolder};
use warden_guard::ActionGuard;
use warden_storage::ApprovalStore;
use warden_vault::{PriorityScorer, VaultStateMachine};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub vault_root: PathBuf,
    pub max_concurrent_tasks: usize,
    pub poll_interval: Duration,
    pub approval_poll_interval: Duration,
    pub max_iterations: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            vault_root: PathBuf::from("."),
            max_concurrent_tasks: 2,
            poll_interval: Duration::from_secs(30),
            approval_poll_interval: Duration::from_secs(2),
            max_iterations: None,
        }
    }
}

pub struct Scheduler<C: Clock> {
    config: SchedulerConfig,
    vault: VaultStateMachine,
    invoker: ReasoningInvoker,
    approvals: ApprovalStore,
    guard: Arc<ActionGuard<C>>,
    retry: PersistenceRetryLoop,
    checkpointer: warden_storage::Checkpointer,
    metrics: Arc<Metrics>,
    scorer: PriorityScorer,
    drivers: DriverRegistry,
    clock: C,
    next_worker_id: AtomicU64,
}

impl<C: Clock> Scheduler<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SchedulerConfig,
        vault: VaultStateMachine,
        invoker: ReasoningInvoker,
        approvals: ApprovalStore,
        guard: Arc<ActionGuard<C>>,
        retry: PersistenceRetryLoop,
        checkpointer: warden_storage::Checkpointer,
        metrics: Arc<Metrics>,
        scorer: PriorityScorer,
        drivers: DriverRegistry,
        clock: C,
    ) -> Self {
        Self { config, vault, invoker, approvals, guard, retry, checkpointer, metrics, scorer, drivers, clock, next_worker_id: AtomicU64::new(0) }
    }

    fn stop_hook_path(&self) -> PathBuf {
        self.config.vault_root.join(".stop_hook")
    }

    fn is_paused(&self) -> bool {
        self.stop_hook_path().exists()
    }

    /// Run the main loop until `cancel` fires or `max_iterations` is hit.
    /// Takes `Arc<Self>` because each worker's task is spawned onto the
    /// runtime rather than awaited in place, so it needs an owned,
    /// `'static` handle back onto the scheduler's shared state.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), VaultError> {
        self.reconcile_in_flight(&cancel).await?;

        let (tx, mut rx) = tokio::sync::mpsc::channel(16);
        let _watcher = self.watch_for_changes(tx);

        let mut iterations: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                break;
            }
            if let Some(max) = self.config.max_iterations {
                if iterations >= max {
                    break;
                }
            }
            iterations += 1;

            if !self.is_paused() {
                self.release_ready_retries()?;
                self.run_one_tick(&cancel).await?;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = rx.recv() => {}
                _ = cancel.cancelled() => break,
            }
        }
        Ok(())
    }

    /// Best-effort filesystem watch so a new task or a freshly-elapsed
    /// retry wakes the loop before `poll_interval` expires. Discovery
    /// itself always falls back to the directory listing in
    /// `list_folder`, so a watcher that fails to set up (missing vault
    /// root, inotify limits) just costs latency, never correctness.
    fn watch_for_changes(&self, tx: tokio::sync::mpsc::Sender<()>) -> Option<notify::RecommendedWatcher> {
        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                if matches!(event.kind, notify::EventKind::Create(_) | notify::EventKind::Modify(_)) {
                    let _ = tx.blocking_send(());
                }
            }
        })
        .ok()?;
        watcher.watch(&self.config.vault_root, notify::RecursiveMode::Recursive).ok()?;
        Some(watcher)
    }

    /// Move any `Error_Queue/` task whose backoff has elapsed back to
    /// `Needs_Action/` so discovery can pick it up.
    fn release_ready_retries(&self) -> Result<(), VaultError> {
        let now = self.clock.now_utc();
        for task in self.list_folder(WorkflowFolder::ErrorQueue)? {
            self.retry.release_if_ready(&task, now, "scheduler")?;
        }
        Ok(())
    }

    fn list_folder(&self, folder: WorkflowFolder) -> Result<Vec<Task>, VaultError> {
        let dir = self.config.vault_root.join(folder.dir_name());
        let mut tasks = Vec::new();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(tasks),
            Err(e) => return Err(VaultError::FileSystemError { message: format!("{}: {e}", dir.display()) }),
        };
        for entry in entries {
            let entry = entry.map_err(|e| VaultError::FileSystemError { message: e.to_string() })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Ok(contents) = std::fs::read_to_string(&path) else { continue };
            if let Ok((task, _body)) = Task::parse_document(&contents) {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }

    /// One discovery + dispatch cycle: find ready tasks in `Needs_Action/`,
    /// rank them highest-score-first, claim each exactly once, and run up
    /// to `max_concurrent_tasks` of them concurrently.
    async fn run_one_tick(self: &Arc<Self>, cancel: &CancellationToken) -> Result<(), VaultError> {
        let now = self.clock.now_utc();
        let mut ready = self.list_folder(WorkflowFolder::NeedsAction)?;
        ready.sort_by(|a, b| {
            self.scorer.score(b, now).partial_cmp(&self.scorer.score(a, now)).unwrap_or(std::cmp::Ordering::Equal)
        });

        if ready.is_empty() {
            return Ok(());
        }
        self.metrics.incr("tasks_discovered");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_tasks));
        let mut workers = JoinSet::new();
        for task in ready {
            if cancel.is_cancelled() {
                break;
            }
            let task = match self.claim(&task)? {
                Some(claimed) => claimed,
                None => continue,
            };
            let scheduler = Arc::clone(self);
            let permit = Arc::clone(&semaphore).acquire_owned().await.map_err(|e| VaultError::FileSystemError { message: e.to_string() })?;
            let cancel = cancel.clone();
            workers.spawn(async move {
                let result = scheduler.process_task(task, &cancel).await;
                drop(permit);
                result
            });
        }
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(result) => result?,
                Err(e) => {
                    tracing::error!(error = %e, "worker task panicked");
                }
            }
        }
        Ok(())
    }

    /// Claim a task by transitioning it out of `Needs_Action/` into
    /// `Plans/`. The vault has a single in-process writer, so this never
    /// races another worker in this scheduler; it can still lose to an
    /// operator manually moving the file (e.g. a direct reject), which
    /// surfaces as `InvalidTransition` or a missing source file and is
    /// treated as "already spoken for" rather than a hard failure.
    ///
    /// Records an [`InFlightEntry`] in the checkpoint so a crash before
    /// the task reaches a terminal folder is visible to
    /// [`Self::reconcile_in_flight`] on the next restart.
    fn claim(&self, task: &Task) -> Result<Option<Task>, VaultError> {
        match self.vault.transition(task, WorkflowFolder::Plans, "claimed by worker", "scheduler") {
            Ok(claimed) => {
                let worker_id = format!("worker-{}", self.next_worker_id.fetch_add(1, Ordering::Relaxed));
                self.record_in_flight(&claimed, &worker_id)?;
                Ok(Some(claimed))
            }
            Err(VaultError::InvalidTransition { .. }) => Ok(None),
            Err(VaultError::FileSystemError { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn record_in_flight(&self, task: &Task, worker_id: &str) -> Result<(), VaultError> {
        let mut checkpoint = self.checkpointer.load().map_err(VaultError::from)?;
        checkpoint.tasks_in_flight.insert(
            task.task_id.as_str().to_string(),
            warden_storage::InFlightEntry {
                state: task.state.dir_name().to_string(),
                attempts: task.retry_count,
                worker_id: worker_id.to_string(),
                started_at: self.clock.now_utc(),
            },
        );
        self.checkpointer.save(&checkpoint).map_err(VaultError::from)
    }

    fn clear_in_flight(&self, task_id: &str) -> Result<(), VaultError> {
        let mut checkpoint = self.checkpointer.load().map_err(VaultError::from)?;
        checkpoint.tasks_in_flight.remove(task_id);
        self.checkpointer.save(&checkpoint).map_err(VaultError::from)
    }

    /// Recover tasks whose worker died mid-flight before reaching a
    /// terminal folder. A `Plans/` task is requeued to `Needs_Action/`
    /// for a fresh pass (the matrix allows that edge and redoing
    /// reasoning is safe); `Pending_Approval/` and `Approved/` tasks have
    /// no such edge back, so they're resumed in place via
    /// [`Self::resume_task`] instead of requeued. An in-flight entry
    /// whose task is no longer in any of those three folders already
    /// reached a terminal state before the crash, so it's just dropped.
    async fn reconcile_in_flight(self: &Arc<Self>, cancel: &CancellationToken) -> Result<(), VaultError> {
        let checkpoint = self.checkpointer.load().map_err(VaultError::from)?;
        if checkpoint.tasks_in_flight.is_empty() {
            return Ok(());
        }

        let mut in_flight = Vec::new();
        for folder in [WorkflowFolder::Plans, WorkflowFolder::PendingApproval, WorkflowFolder::Approved] {
            in_flight.extend(self.list_folder(folder)?);
        }

        for task_id in checkpoint.tasks_in_flight.keys() {
            let found = in_flight.iter().find(|t| t.task_id.as_str() == task_id).cloned();
            match found {
                None => self.clear_in_flight(task_id)?,
                Some(task) if task.state == WorkflowFolder::Plans => {
                    tracing::warn!(task_id = %task.task_id, "requeueing stale in-flight task to Needs_Action after restart");
                    self.vault.transition(&task, WorkflowFolder::NeedsAction, "requeued after restart: worker died mid-flight", "scheduler")?;
                    self.clear_in_flight(task_id)?;
                }
                Some(task) => {
                    tracing::warn!(task_id = %task.task_id, state = task.state.dir_name(), "resuming stale in-flight task after restart");
                    let scheduler = Arc::clone(self);
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        if let Err(e) = scheduler.resume_task(task, &cancel).await {
                            tracing::error!(error = %e, "resuming in-flight task failed");
                        }
                    });
                }
            }
        }
        Ok(())
    }

    /// Continue a task found sitting in `Pending_Approval/` or
    /// `Approved/` at restart: finish whichever step it was mid-way
    /// through rather than redoing reasoning, which already ran before
    /// the crash.
    async fn resume_task(&self, task: Task, cancel: &CancellationToken) -> Result<(), VaultError> {
        let (task, actions) = match task.state {
            WorkflowFolder::PendingApproval => {
                let approval = self
                    .approvals
                    .list_for_task(&task.task_id)
                    .map_err(VaultError::from)?
                    .into_iter()
                    .max_by_key(|a| a.created_at);
                let Some(approval) = approval else {
                    let reviewed = self.vault.transition(&task, WorkflowFolder::NeedsHumanReview, "resumed with no matching approval record", "scheduler")?;
                    self.checkpoint_progress(&reviewed)?;
                    return Ok(());
                };
                match self.finish_approval_wait(&task, approval.approval_id, cancel).await? {
                    Some((approved_task, payload)) => (approved_task, vec![(Some(approval.approval_id), payload)]),
                    None => {
                        self.checkpoint_progress(&task)?;
                        return Ok(());
                    }
                }
            }
            WorkflowFolder::Approved => {
                let approval = self
                    .approvals
                    .list_for_task(&task.task_id)
                    .map_err(VaultError::from)?
                    .into_iter()
                    .find(|a| a.status == ApprovalStatus::Approved);
                match approval {
                    Some(approval) => (task, vec![(Some(approval.approval_id), approval.action_payload)]),
                    None => (task, Vec::new()),
                }
            }
            _ => (task, Vec::new()),
        };

        let mut any_failure: Option<VaultError> = None;
        for (approval_id, payload) in &actions {
            if let Err(e) = self.run_action(&task, *approval_id, payload).await {
                any_failure = Some(e);
                break;
            }
        }

        match any_failure {
            None => {
                self.vault.transition(&task, WorkflowFolder::Done, "all actions succeeded", "scheduler")?;
                self.metrics.incr("tasks_completed");
                self.metrics.record_outcome(self.clock.now_utc(), false);
            }
            Some(e) => {
                self.retry.handle_failure(&task, &e, self.clock.now_utc(), "scheduler")?;
                self.metrics.record_outcome(self.clock.now_utc(), true);
            }
        }

        self.checkpoint_progress(&task)
    }

    async fn process_task(&self, task: Task, cancel: &CancellationToken) -> Result<(), VaultError> {
        let trace_id = TraceId::new();
        let reasoning_start = Instant::now();
        let reasoning = tokio::select! {
            result = self.invoker.invoke(&task, trace_id) => result,
            _ = cancel.cancelled() => return Ok(()),
        };
        self.metrics.observe("reasoning_duration", reasoning_start.elapsed());

        let outcome = match reasoning {
            Ok(outcome) => outcome,
            Err(e) => {
                self.retry.handle_failure(&task, &e, self.clock.now_utc(), "scheduler")?;
                self.metrics.incr("tasks_failed");
                return Ok(());
            }
        };

        if outcome.exit_code != 0 {
            let e = VaultError::ReasoningCrashed { detail: format!("exit code {}", outcome.exit_code) };
            self.retry.handle_failure(&task, &e, self.clock.now_utc(), "scheduler")?;
            return Ok(());
        }

        let (task, actions) = match outcome.produced_approvals.first() {
            Some(approval) => match self.drive_approval(&task, approval.approval_id, cancel).await? {
                Some((approved_task, payload)) => (approved_task, vec![(Some(approval.approval_id), payload)]),
                None => return Ok(()),
            },
            None => {
                let pending = self.vault.transition(&task, WorkflowFolder::PendingApproval, "no approval required", "scheduler")?;
                let approved = self.vault.transition(&pending, WorkflowFolder::Approved, "auto-approved: no approval required", "scheduler")?;
                (approved, Vec::new())
            }
        };

        let mut any_failure: Option<VaultError> = None;
        for (approval_id, payload) in &actions {
            if let Err(e) = self.run_action(&task, *approval_id, payload).await {
                any_failure = Some(e);
                break;
            }
        }

        match any_failure {
            None => {
                self.vault.transition(&task, WorkflowFolder::Done, "all actions succeeded", "scheduler")?;
                self.metrics.incr("tasks_completed");
                self.metrics.record_outcome(self.clock.now_utc(), false);
            }
            Some(e) => {
                self.retry.handle_failure(&task, &e, self.clock.now_utc(), "scheduler")?;
                self.metrics.record_outcome(self.clock.now_utc(), true);
            }
        }

        self.checkpoint_progress(&task)?;
        Ok(())
    }

    /// Transition into `Pending_Approval/`, then hand off to
    /// [`Self::finish_approval_wait`]. Returns the task in its
    /// post-decision location alongside the approved action payload, or
    /// `None` if nothing is left to execute.
    async fn drive_approval(
        &self,
        task: &Task,
        approval_id: ApprovalId,
        cancel: &CancellationToken,
    ) -> Result<Option<(Task, serde_json::Value)>, VaultError> {
        let pending = self.vault.transition(task, WorkflowFolder::PendingApproval, "awaiting approval", "scheduler")?;
        self.finish_approval_wait(&pending, approval_id, cancel).await
    }

    /// Block on the decision for a task already sitting in
    /// `Pending_Approval/`, then route to `Approved/`, `Rejected/`, or
    /// (on timeout) `Needs_Human_Review/`. Split out from
    /// [`Self::drive_approval`] so [`Self::resume_task`] can re-enter the
    /// wait after a restart without re-running the initial transition
    /// into a state the task is already in.
    async fn finish_approval_wait(
        &self,
        pending: &Task,
        approval_id: ApprovalId,
        cancel: &CancellationToken,
    ) -> Result<Option<(Task, serde_json::Value)>, VaultError> {
        let wait_start = Instant::now();

        let status = tokio::select! {
            status = self.wait_for_decision(&approval_id) => status?,
            _ = cancel.cancelled() => return Ok(None),
        };
        self.metrics.observe("approval_wait", wait_start.elapsed());

        match status {
            ApprovalStatus::Approved => {
                let approval = self.approvals.load(&approval_id).map_err(VaultError::from)?;
                let approved = self.vault.transition(pending, WorkflowFolder::Approved, "approval granted", "scheduler")?;
                self.metrics.incr("approvals_approved");
                Ok(Some((approved, approval.action_payload)))
            }
            ApprovalStatus::Rejected => {
                self.vault.transition(pending, WorkflowFolder::Rejected, "approval rejected", "scheduler")?;
                self.metrics.incr("approvals_rejected");
                Ok(None)
            }
            ApprovalStatus::Timeout => {
                self.vault.transition(pending, WorkflowFolder::NeedsHumanReview, "approval timed out without a decision", "scheduler")?;
                self.metrics.incr("approvals_timed_out");
                Ok(None)
            }
            ApprovalStatus::Pending => unreachable!("wait_for_decision only returns a terminal status"),
        }
    }

    async fn wait_for_decision(&self, approval_id: &ApprovalId) -> Result<ApprovalStatus, VaultError> {
        loop {
            let approval = self.approvals.load(approval_id).map_err(VaultError::from)?;
            if approval.status.is_terminal() {
                return Ok(approval.status);
            }
            if let Some(expired) = self.approvals.expire_if_due(approval_id, self.clock.now_utc())? {
                return Ok(expired.status);
            }
            tokio::time::sleep(self.config.approval_poll_interval).await;
        }
    }

    async fn run_action(&self, _task: &Task, approval_id: Option<ApprovalId>, payload: &serde_json::Value) -> Result<(), VaultError> {
        let driver_name = payload
            .get("driver")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| VaultError::ValidationError { reason: "approved action payload is missing a driver name".to_string() })?;
        let action_type = payload.get("action_type").and_then(serde_json::Value::as_str).unwrap_or("other");
        let binding = self
            .drivers
            .get(driver_name)
            .ok_or_else(|| VaultError::VerificationError { driver: driver_name.to_string(), reason: "driver is not registered".to_string() })?;

        self.metrics.incr("driver_invocations");
        let action_start = Instant::now();
        let result = self.guard.execute(driver_name, action_type, payload.clone(), binding, approval_id).await;
        self.metrics.observe("action_duration", action_start.elapsed());

        if result.is_err() {
            self.metrics.incr("driver_failures");
        }
        result.map(|_| ())
    }

    fn checkpoint_progress(&self, task: &Task) -> Result<(), VaultError> {
        let mut checkpoint = self.checkpointer.load().map_err(VaultError::from)?;
        checkpoint.last_poll = Utc::now();
        checkpoint.tasks_in_flight.remove(task.task_id.as_str());
        self.checkpointer.save(&checkpoint).map_err(VaultError::from)
    }

    pub fn health(&self, last_completion: Option<chrono::DateTime<Utc>>) -> crate::metrics::Health {
        let checkpoint_ok = self.checkpointer.load().is_ok();
        self.metrics.health(
            self.clock.now_utc(),
            HealthInputs { any_circuit_open: self.guard.any_circuit_open(), last_completion, checkpoint_save_succeeding: checkpoint_ok },
        )
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
