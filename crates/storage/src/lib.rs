// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-storage: durable, file-backed persistence for the task vault —
//! the append-only audit log, scheduler checkpoints, the replay-protection
//! nonce registry, and the approval store.

mod approval_store;
mod audit_log;
mod checkpoint;
mod error;
mod nonce;

pub use approval_store::{content_digest, ApprovalStore};
pub use audit_log::{AuditFilter, AuditLog};
pub use checkpoint::{Checkpointer, InFlightEntry, SchedulerCheckpoint};
pub use error::StorageError;
pub use nonce::NonceRegistry;
