// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Compiled regex set for known credential shapes.

use crate::{Finding, FindingKind};
use regex::Regex;
use std::sync::OnceLock;

struct CompiledPattern {
    kind: FindingKind,
    regex: Regex,
}

fn patterns() -> &'static [CompiledPattern] {
    static PATTERNS: OnceLock<Vec<CompiledPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            CompiledPattern {
                kind: FindingKind::ApiKeyAssignment,
                regex: Regex::new(
                    r#"(?i)\b(api[_-]?key|secret|password|token)\s*[:=]\s*['"]?[A-Za-z0-9_\-/+=]{12,}['"]?"#,
                )
                .expect("static pattern is valid"),
            },
            CompiledPattern {
                kind: FindingKind::BearerToken,
                regex: Regex::new(r"(?i)\bBearer\s+[A-Za-z0-9_\-\.=]{10,}")
                    .expect("static pattern is valid"),
            },
            CompiledPattern {
                kind: FindingKind::PrivateKeyPem,
                regex: Regex::new(r"-----BEGIN [A-Z ]*PRIVATE KEY-----")
                    .expect("static pattern is valid"),
            },
            CompiledPattern {
                kind: FindingKind::AwsAccessKey,
                regex: Regex::new(r"\bAKIA[0-9A-Z]{16}\b").expect("static pattern is valid"),
            },
            CompiledPattern {
                kind: FindingKind::GithubToken,
                regex: Regex::new(r"\bgh[pousr]_[A-Za-z0-9]{36,}\b")
                    .expect("static pattern is valid"),
            },
            CompiledPattern {
                kind: FindingKind::SlackToken,
                regex: Regex::new(r"\bxox[baprs]-[A-Za-z0-9-]{10,}\b")
                    .expect("static pattern is valid"),
            },
            CompiledPattern {
                kind: FindingKind::StripeKey,
                regex: Regex::new(r"\bsk_(live|test)_[A-Za-z0-9]{16,}\b")
                    .expect("static pattern is valid"),
            },
        ]
    })
}

pub fn scan_known_patterns(text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for pattern in patterns() {
        for m in pattern.regex.find_iter(text) {
            findings.push(Finding { kind: pattern.kind, start: m.start(), end: m.end() });
        }
    }
    findings
}

#[cfg(test)]
#[path = "patterns_tests.rs"]
mod tests;
