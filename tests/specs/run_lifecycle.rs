//! `wardend run` is a single foreground process, not a daemon with its
//! own stop subcommand, so these specs drive it the same way an
//! operator's supervisor would: spawn it, confirm it's alive, send
//! SIGTERM, and confirm it exits instead of hanging.

use crate::prelude::*;

#[cfg(unix)]
fn send_sigterm(pid: u32) {
    std::process::Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()
        .expect("sending SIGTERM");
}

#[test]
#[cfg(unix)]
fn run_starts_and_exits_cleanly_on_sigterm() {
    let project = Project::empty();
    project.wardend().arg("init").passes();
    // No reasoning binary on PATH; an empty vault never invokes it, so the
    // loop just polls an empty Needs_Action and sleeps.
    project.file("warden.yaml", "poll_interval_secs: 1\n");

    let mut child =
        project.wardend_std().arg("run").spawn().expect("spawning wardend run");

    let alive = wait_for(1_000, || child.try_wait().ok().flatten().is_none());
    assert!(alive, "wardend run should still be running shortly after start");

    send_sigterm(child.id());

    let exited = wait_for(SPEC_WAIT_MAX_MS, || child.try_wait().ok().flatten().is_some());
    assert!(exited, "wardend run should exit after SIGTERM");
}

#[test]
fn run_fails_fast_on_an_unreadable_config() {
    let project = Project::empty();
    project.file("warden.yaml", "max_concurrent_tasks: [not, a, number]\n");

    project.wardend().arg("run").fails();
}
