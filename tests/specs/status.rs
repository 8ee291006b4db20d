use crate::prelude::*;

#[test]
fn status_reports_never_polled_before_any_run() {
    let project = Project::empty();
    project.wardend().arg("init").passes();

    project.wardend().arg("status").passes().stdout_has("last poll: never");
}

#[test]
fn status_reflects_a_seeded_task_in_needs_action() {
    let project = Project::empty();
    project.wardend().arg("init").passes();
    project.seed_task(
        "Needs_Action",
        "manual_spec-task_2026-01-01T00-00.md",
        "task_id: tsk-spec0002\n\
         source: manual\n\
         subject: spec task\n\
         priority: medium\n\
         created_at: 2026-01-01T00:00:00Z\n\
         state: needs_action\n\
         retry_count: 0\n",
        "body",
    );

    project.wardend().args(["status", "--output", "json"]).passes().stdout_has("\"Needs_Action\"");
}

#[test]
fn status_reports_paused_when_stop_hook_present() {
    let project = Project::empty();
    project.wardend().arg("init").passes();
    project.file("vault/.stop_hook", "paused");

    project.wardend().arg("status").passes().stdout_has("paused: true");
}
