use crate::prelude::*;

#[test]
fn wardend_help_shows_usage() {
    cli().arg("--help").passes().stdout_has("Usage:");
}

#[test]
fn wardend_version_reports_a_version() {
    cli().arg("--version").passes().stdout_has("wardend");
}

#[test]
fn wardend_no_args_is_a_usage_error() {
    cli().fails().stderr_has("Usage:");
}

#[test]
fn driver_help_shows_register_subcommand() {
    cli().args(["driver", "--help"]).passes().stdout_has("register");
}
