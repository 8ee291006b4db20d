// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use crate::output::{format_or_json, OutputFormat};
use anyhow::{Context, Result};
use std::collections::HashMap;
use warden_core::approval::ActionType;
use warden_core::{ApprovalId, Clock, SystemClock};
use warden_storage::ApprovalStore;

pub fn handle(
    vault_root: &std::path::Path,
    approval_id: &str,
    approver: &str,
    authorized_approvers: &HashMap<ActionType, Vec<String>>,
    format: OutputFormat,
) -> Result<()> {
    let store = ApprovalStore::open(vault_root.join("Approvals")).context("opening approval store")?;
    let id = ApprovalId::from_string(approval_id);
    let approval = store
        .approve(&id, approver, authorized_approvers, SystemClock.now_utc())
        .with_context(|| format!("approving {approval_id}"))?;

    format_or_json(format, &approval, || {
        println!("{} approved by {}", approval.approval_id, crate::color::header(approver));
    })
}

#[cfg(test)]
#[path = "approve_tests.rs"]
mod tests;
