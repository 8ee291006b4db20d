// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Shannon-entropy detection for high-entropy base64/hex runs that don't
//! match any known credential prefix.

use crate::{Finding, FindingKind};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Minimum run length considered for entropy scoring.
const MIN_RUN_LEN: usize = 20;

/// Bits-per-character threshold above which a run is flagged.
const ENTROPY_THRESHOLD: f64 = 4.0;

fn candidate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9+/_=-]{20,}").expect("static pattern is valid")
    })
}

/// Shannon entropy of `s` in bits per character.
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<char, usize> = HashMap::new();
    for ch in s.chars() {
        *counts.entry(ch).or_insert(0) += 1;
    }
    let len = s.chars().count() as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

pub fn scan_high_entropy_runs(text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for m in candidate_regex().find_iter(text) {
        let run = m.as_str();
        if run.len() < MIN_RUN_LEN {
            continue;
        }
        if shannon_entropy(run) >= ENTROPY_THRESHOLD {
            findings.push(Finding {
                kind: FindingKind::HighEntropyRun,
                start: m.start(),
                end: m.end(),
            });
        }
    }
    findings
}

#[cfg(test)]
#[path = "entropy_tests.rs"]
mod tests;
