use crate::prelude::*;

fn seed_pending_approval(project: &Project, approver: &str) -> String {
    project.file("warden.yaml", &format!("authorized_approvers:\n  delete:\n    - {approver}\n"));
    project.wardend().args(["init", "--force"]).passes();

    let id = "apr-spec0001";
    let frontmatter = format!(
        "approval_id: {id}\n\
         task_id: tsk-spec0001\n\
         action_type: delete\n\
         risk_level: high\n\
         status: pending\n\
         nonce: nonce-spec0001\n\
         content_digest: 0000000000000000000000000000000000000000000000000000000000000000\n\
         created_at: 2026-01-01T00:00:00Z\n\
         expires_at: 2099-01-01T00:00:00Z\n\
         action_payload: {{}}\n"
    );
    project.seed_task("Approvals", &format!("{id}.md"), &frontmatter, "");
    id.to_string()
}

#[test]
fn approving_a_pending_approval_as_an_authorized_approver_succeeds() {
    let project = Project::empty();
    let id = seed_pending_approval(&project, "alice");

    project
        .wardend()
        .args(["approve", &id, "--approver", "alice"])
        .passes()
        .stdout_has("approved");
}

#[test]
fn approving_as_an_unauthorized_approver_fails() {
    let project = Project::empty();
    let id = seed_pending_approval(&project, "alice");

    project.wardend().args(["approve", &id, "--approver", "mallory"]).fails();
}

#[test]
fn rejecting_records_the_reason() {
    let project = Project::empty();
    let id = seed_pending_approval(&project, "alice");

    project
        .wardend()
        .args(["reject", &id, "--approver", "alice", "--reason", "too risky"])
        .passes()
        .stdout_has("too risky");
}
