//! Shared black-box test harness: a disposable [`Project`] directory and
//! a [`CommandExt`] extension that turns `assert_cmd::Command` output
//! into a chainable assertion surface, mirroring how the rest of this
//! workspace's tests favor small composable helpers over one-off
//! `std::process::Command` calls scattered through every spec.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Upper bound for [`wait_for`] polling loops. Specs that drive a
/// background `wardend run` process poll rather than sleep a fixed
/// amount, since the exact timing of a poll-interval-driven loop isn't
/// worth pinning down precisely.
pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// Poll `check` every 20ms until it returns `true` or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// A disposable vault directory plus the sidecar files (`warden.yaml`,
/// `trust.json`, `checkpoint.json`) every `wardend` invocation needs.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().expect("creating temp project dir") }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn vault_root(&self) -> PathBuf {
        self.path().join("vault")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("warden.yaml")
    }

    pub fn trust_store_path(&self) -> PathBuf {
        self.path().join("trust.json")
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.path().join("checkpoint.json")
    }

    /// Write `rel` (relative to the project root) with `contents`,
    /// creating parent directories as needed.
    pub fn file(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("creating parent directories");
        }
        std::fs::write(&path, contents).expect("writing project file");
        self
    }

    /// Write a task document directly into one of the vault's workflow
    /// folders, bypassing the scheduler's own discovery/transition path.
    /// Used to seed a vault into a mid-flow state a spec wants to
    /// observe without driving every step that would normally get it
    /// there.
    pub fn seed_task(&self, folder_dir: &str, filename: &str, frontmatter: &str, body: &str) -> PathBuf {
        let dir = self.vault_root().join(folder_dir);
        std::fs::create_dir_all(&dir).expect("creating workflow folder");
        let path = dir.join(filename);
        let doc = format!("---\n{}\n---\n{}\n", frontmatter.trim_end(), body);
        std::fs::write(&path, doc).expect("writing seeded task");
        path
    }

    /// A `wardend` command pre-wired with this project's paths. Callers
    /// append the subcommand and its own args.
    pub fn wardend(&self) -> Command {
        let mut cmd = Command::cargo_bin("wardend").expect("locating wardend binary");
        cmd.current_dir(self.path())
            .arg("--vault-root")
            .arg(self.vault_root())
            .arg("--config")
            .arg(self.config_path())
            .arg("--trust-store")
            .arg(self.trust_store_path())
            .arg("--checkpoint")
            .arg(self.checkpoint_path());
        cmd
    }

    /// Same wiring as [`Project::wardend`], but as a bare
    /// `std::process::Command` so callers can `spawn` it and keep a
    /// handle to the live child (`assert_cmd::Command` only exposes
    /// run-to-completion helpers like `output`/`assert`).
    pub fn wardend_std(&self) -> std::process::Command {
        let bin = assert_cmd::cargo::cargo_bin("wardend");
        let mut cmd = std::process::Command::new(bin);
        cmd.current_dir(self.path())
            .arg("--vault-root")
            .arg(self.vault_root())
            .arg("--config")
            .arg(self.config_path())
            .arg("--trust-store")
            .arg(self.trust_store_path())
            .arg("--checkpoint")
            .arg(self.checkpoint_path());
        cmd
    }
}

/// A finished process run, captured once so a spec can chain several
/// assertions against the same stdout/stderr without re-running anything.
pub struct RunOutput {
    stdout: String,
    stderr: String,
}

impl RunOutput {
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn stdout_has(&self, needle: &str) -> &Self {
        assert!(self.stdout.contains(needle), "expected stdout to contain {needle:?}, got:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(&self, needle: &str) -> &Self {
        assert!(self.stderr.contains(needle), "expected stderr to contain {needle:?}, got:\n{}", self.stderr);
        self
    }
}

/// Run-and-assert helpers layered onto `assert_cmd::Command`, matching
/// the rest of this workspace's preference for propagated `Result`s
/// everywhere except test assertions, where a clear panic message beats
/// a silently swallowed error.
pub trait CommandExt {
    fn passes(&mut self) -> RunOutput;
    fn fails(&mut self) -> RunOutput;
}

impl CommandExt for Command {
    fn passes(&mut self) -> RunOutput {
        let output = self.output().expect("spawning wardend");
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    fn fails(&mut self) -> RunOutput {
        let output = self.output().expect("spawning wardend");
        assert!(!output.status.success(), "expected failure but command succeeded");
        RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// A bare `wardend` command with no project context, for specs that only
/// need `--help`/`--version`.
pub fn cli() -> Command {
    Command::cargo_bin("wardend").expect("locating wardend binary")
}
