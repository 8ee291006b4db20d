use crate::prelude::*;

#[test]
fn registering_a_driver_binary_records_its_digest() {
    let project = Project::empty();
    project.file("drivers/shell.sh", "#!/bin/sh\necho hi\n");

    project
        .wardend()
        .args(["driver", "register", "shell", "drivers/shell.sh", "--source", "operator"])
        .passes()
        .stdout_has("registered driver 'shell'");

    let trust = std::fs::read_to_string(project.trust_store_path()).unwrap();
    assert!(trust.contains("shell"));
    assert!(trust.contains("operator"));
}

#[test]
fn registering_a_missing_binary_is_an_error() {
    let project = Project::empty();

    project
        .wardend()
        .args(["driver", "register", "shell", "drivers/missing.sh"])
        .fails();
}

#[test]
fn register_defaults_the_source_to_operator() {
    let project = Project::empty();
    project.file("drivers/shell.sh", "#!/bin/sh\necho hi\n");

    project
        .wardend()
        .args(["driver", "register", "shell", "drivers/shell.sh"])
        .passes()
        .stdout_has("(operator)");
}
