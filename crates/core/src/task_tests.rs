// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;

#[test]
fn filename_matches_canonical_grammar() {
    let task = Task::builder()
        .source(TaskSource::Mail)
        .subject("Invoice for Client A")
        .build();
    let name = task.filename();
    assert!(filename_regex().is_match(&name), "{name} did not match canonical grammar");
    assert!(name.starts_with("mail_invoice-client"));
}

#[test]
fn parse_filename_round_trips_known_good_name() {
    let (source, slug, ts) =
        Task::parse_filename("mail_client-a-invoice_2026-01-28T10-00.md").unwrap();
    assert_eq!(source, TaskSource::Mail);
    assert_eq!(slug, "client-a-invoice");
    assert_eq!(ts.format("%Y-%m-%dT%H:%M").to_string(), "2026-01-28T10:00");
}

#[test]
fn parse_filename_rejects_unknown_source() {
    let err = Task::parse_filename("carrierpigeon_hello_2026-01-28T10-00.md").unwrap_err();
    assert_eq!(err.label(), "validation_error");
}

#[test]
fn parse_filename_rejects_malformed_timestamp() {
    assert!(Task::parse_filename("mail_hello_not-a-date.md").is_err());
}

#[test]
fn transition_matrix_allows_inbox_to_needs_action_but_not_inbox_to_done() {
    assert!(WorkflowFolder::Inbox.can_transition_to(WorkflowFolder::NeedsAction));
    assert!(!WorkflowFolder::Inbox.can_transition_to(WorkflowFolder::Done));
}

#[test]
fn dir_name_round_trips_through_parse() {
    for folder in WorkflowFolder::ALL {
        assert_eq!(WorkflowFolder::parse(folder.dir_name()), Some(folder));
    }
}

#[test]
fn document_round_trip_preserves_frontmatter_and_body() {
    let task = Task::builder()
        .source(TaskSource::Chat)
        .subject("Deploy the release branch")
        .priority(Priority::High)
        .build();
    let body = "## Notes\n\nSome task body content.\n";
    let doc = task.to_document(body).unwrap();
    assert!(doc.starts_with("---\n"));

    let (parsed, parsed_body) = Task::parse_document(&doc).unwrap();
    assert_eq!(parsed.task_id, task.task_id);
    assert_eq!(parsed.subject, task.subject);
    assert_eq!(parsed.priority, Priority::High);
    assert_eq!(parsed_body, body);
}

#[test]
fn parse_document_rejects_missing_delimiters() {
    let err = Task::parse_document("just a plain markdown file\n").unwrap_err();
    assert_eq!(err.label(), "validation_error");
}
