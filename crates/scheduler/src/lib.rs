// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-scheduler: the Ralph Wiggum Loop. Discovers ready tasks in
//! `Needs_Action/`, invokes the reasoning subprocess, drives approvals,
//! dispatches approved actions through the driver registry, and parks
//! or retires failures through the bounded-backoff persistence loop.

mod driver_registry;
mod metrics;
mod reasoning_invoker;
mod retry_loop;
mod scheduler;

pub use driver_registry::DriverRegistry;
pub use metrics::{Health, HealthInputs, HistogramSummary, Metrics};
pub use reasoning_invoker::{InvokerConfig, ReasoningInvoker, ReasoningOutcome};
pub use retry_loop::{PersistenceRetryLoop, RetryConfig};
pub use scheduler::{Scheduler, SchedulerConfig};
