use crate::prelude::*;

#[test]
fn init_scaffolds_every_workflow_folder() {
    let project = Project::empty();

    project.wardend().arg("init").passes().stdout_has("vault initialized");

    for dir in [
        "Inbox",
        "Needs_Action",
        "Plans",
        "Pending_Approval",
        "Approved",
        "Rejected",
        "Done",
        "Error_Queue",
        "Failed",
        "Needs_Human_Review",
        "Logs",
        "Briefings",
        "Approvals",
    ] {
        assert!(project.vault_root().join(dir).is_dir(), "missing {dir}");
    }
    assert!(project.config_path().exists());
}

#[test]
fn init_without_force_preserves_an_existing_config() {
    let project = Project::empty();
    project.file("warden.yaml", "max_concurrent_tasks: 41\n");

    project.wardend().arg("init").passes();

    let contents = std::fs::read_to_string(project.config_path()).unwrap();
    assert!(contents.contains("41"));
}

#[test]
fn init_with_force_overwrites_the_config() {
    let project = Project::empty();
    project.file("warden.yaml", "max_concurrent_tasks: 41\n");

    project.wardend().args(["init", "--force"]).passes();

    let contents = std::fs::read_to_string(project.config_path()).unwrap();
    assert!(!contents.contains("41"));
}

#[test]
fn status_on_an_uninitialized_vault_still_reports_zero_counts() {
    let project = Project::empty();
    project.wardend().arg("init").passes();

    project.wardend().args(["status", "--output", "json"]).passes().stdout_has("folder_counts");
}
