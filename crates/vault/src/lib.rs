// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-vault: the task record's only writer. `VaultStateMachine`
//! enforces the workflow folder transition matrix with crash-safe atomic
//! renames; `PriorityScorer` ranks pending tasks for the scheduler's
//! queue.

mod priority_scorer;
mod state_machine;

pub use priority_scorer::{PriorityScorer, ScorerConfig};
pub use state_machine::VaultStateMachine;
