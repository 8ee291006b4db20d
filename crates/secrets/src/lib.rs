// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-secrets: pure, stateless credential detection and redaction.
//!
//! Every value that reaches the audit log or a scan command passes
//! through [`redact`] first. The scanner never touches disk and never
//! holds state across calls, so it can be exercised directly by the
//! `scan` CLI subcommand as well as by the audit writer.

mod entropy;
mod patterns;

pub use entropy::shannon_entropy;

use std::panic::{catch_unwind, AssertUnwindSafe};

pub const REDACTED_PLACEHOLDER: &str = "***REDACTED***";
pub const REDACTION_FAILED_PLACEHOLDER: &str = "***REDACTION_FAILED***";

/// One credential-shaped match found in a scanned text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    ApiKeyAssignment,
    BearerToken,
    PrivateKeyPem,
    AwsAccessKey,
    GithubToken,
    SlackToken,
    StripeKey,
    HighEntropyRun,
}

warden_core::simple_display! {
    FindingKind {
        ApiKeyAssignment => "api_key_assignment",
        BearerToken => "bearer_token",
        PrivateKeyPem => "private_key_pem",
        AwsAccessKey => "aws_access_key",
        GithubToken => "github_token",
        SlackToken => "slack_token",
        StripeKey => "stripe_key",
        HighEntropyRun => "high_entropy_run",
    }
}

/// Scan `text` for credential-shaped substrings. Pure and stateless.
pub fn scan(text: &str) -> Vec<Finding> {
    let mut findings = patterns::scan_known_patterns(text);
    findings.extend(entropy::scan_high_entropy_runs(text));
    findings.sort_by_key(|f| f.start);
    findings
}

/// Replace every credential-shaped substring in `text` with a fixed
/// placeholder. Fails closed: if scanning panics for any reason, the
/// entire text is replaced with [`REDACTION_FAILED_PLACEHOLDER`] rather
/// than risk leaking an un-redacted value.
pub fn redact(text: &str) -> String {
    match catch_unwind(AssertUnwindSafe(|| redact_inner(text))) {
        Ok(redacted) => redacted,
        Err(_) => {
            tracing::error!("secrets scanner panicked during redaction; failing closed");
            REDACTION_FAILED_PLACEHOLDER.to_string()
        }
    }
}

fn redact_inner(text: &str) -> String {
    let findings = scan(text);
    if findings.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for finding in findings {
        if finding.start < cursor {
            // Overlapping match from a later, broader pattern; skip it.
            continue;
        }
        out.push_str(&text[cursor..finding.start]);
        out.push_str(REDACTED_PLACEHOLDER);
        cursor = finding.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
