// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! `wardend scan` — run the credential scanner over a file or stdin.
//! Never prints the matched substring itself, only its kind and span,
//! since the whole point is to avoid putting secrets on a terminal.

use crate::output::{handle_list, OutputFormat};
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

pub fn handle(path: Option<&Path>, redact: bool, format: OutputFormat) -> Result<()> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };

    let findings = warden_secrets::scan(&text);
    handle_list(format, &findings, "no credential-shaped content found", |items| {
        for finding in items {
            println!("{}  bytes {}..{}", finding.kind, finding.start, finding.end);
        }
    })?;

    if redact {
        println!("\n{}", warden_secrets::redact(&text));
    }

    if !findings.is_empty() && format == OutputFormat::Text {
        println!("\n{} finding(s)", findings.len());
    }
    Ok(())
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
