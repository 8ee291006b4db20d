// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! `wardend`: the CLI entry point and, via `wardend run`, the scheduler
//! process itself. Kept thin by design — everything a subcommand does
//! is a call into `warden-core`/`warden-storage`/`warden-guard`/
//! `warden-vault`/`warden-scheduler`; this crate only parses arguments,
//! loads configuration, and renders output.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use config::Config;
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wardend", version, about = "File-driven autonomous task orchestrator", styles = color::styles())]
struct Cli {
    /// Path to the vault root. Overrides the config file's `vault_root`.
    #[arg(long, global = true)]
    vault_root: Option<PathBuf>,

    /// Path to the warden.yaml config file.
    #[arg(long, global = true, default_value = "warden.yaml")]
    config: PathBuf,

    /// Path to the driver trust registry.
    #[arg(long, global = true, default_value = "trust.json")]
    trust_store: PathBuf,

    /// Path to the scheduler checkpoint file.
    #[arg(long, global = true, default_value = "checkpoint.json")]
    checkpoint: PathBuf,

    #[arg(long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scaffold a fresh vault directory tree and a default config file.
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Run the scheduler loop until SIGINT/SIGTERM.
    Run {},
    /// Approve a pending approval.
    Approve {
        approval_id: String,
        #[arg(long)]
        approver: String,
    },
    /// Reject a pending approval.
    Reject {
        approval_id: String,
        #[arg(long)]
        approver: String,
        #[arg(long)]
        reason: String,
    },
    /// Show a snapshot of vault folder counts, checkpoint state, and recent audit events.
    Status {
        #[arg(long, default_value_t = 20)]
        recent: usize,
    },
    /// Scan a file (or stdin) for credential-shaped content.
    Scan {
        path: Option<PathBuf>,
        #[arg(long)]
        redact: bool,
    },
    /// Manage the driver trust registry.
    Driver {
        #[command(subcommand)]
        command: DriverCommand,
    },
}

#[derive(Subcommand)]
enum DriverCommand {
    /// Register a driver binary's digest as trusted.
    Register {
        name: String,
        binary_path: PathBuf,
        #[arg(long, default_value = "operator")]
        source: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(&cli.config)?;
    if let Some(root) = cli.vault_root {
        config.vault_root = root;
    }

    match cli.command {
        Command::Init { force } => commands::init::handle(&config.vault_root, &cli.config, force),
        Command::Run {} => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::run::handle(config, cli.trust_store, cli.checkpoint))
        }
        Command::Approve { approval_id, approver } => {
            commands::approve::handle(&config.vault_root, &approval_id, &approver, &config.authorized_approvers, cli.output)
        }
        Command::Reject { approval_id, approver, reason } => {
            commands::reject::handle(&config.vault_root, &approval_id, &approver, &config.authorized_approvers, &reason, cli.output)
        }
        Command::Status { recent } => commands::status::handle(&config.vault_root, cli.output, recent),
        Command::Scan { path, redact } => commands::scan::handle(path.as_deref(), redact, cli.output),
        Command::Driver { command: DriverCommand::Register { name, binary_path, source } } => {
            commands::driver::register(&cli.trust_store, &name, &binary_path, &source)
        }
    }
}
