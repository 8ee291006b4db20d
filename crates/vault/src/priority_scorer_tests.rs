// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use super::*;
use chrono::Duration;
use warden_core::TaskSource;

fn base_task() -> Task {
    Task::builder().source(TaskSource::Mail).subject("Quarterly report").priority(Priority::Medium).build()
}

#[test]
fn urgent_keyword_in_subject_overrides_frontmatter_priority() {
    let task = Task::builder()
        .source(TaskSource::Mail)
        .subject("URGENT: server is down")
        .priority(Priority::Low)
        .build();
    assert_eq!(urgency(&task), 5);
}

#[test]
fn falls_back_to_frontmatter_priority_with_no_keyword() {
    let task = base_task();
    assert_eq!(urgency(&task), 3);
}

#[test]
fn deadline_bucket_shrinks_as_the_deadline_approaches() {
    let now = Utc::now();
    let mut task = base_task();
    task.deadline = Some(now + Duration::minutes(30));
    assert_eq!(deadline(&task, now), 5);
    task.deadline = Some(now + Duration::hours(20));
    assert_eq!(deadline(&task, now), 4);
    task.deadline = Some(now + Duration::days(5));
    assert_eq!(deadline(&task, now), 2);
    task.deadline = None;
    assert_eq!(deadline(&task, now), 1);
}

#[test]
fn vip_sender_outranks_client_and_unknown() {
    let scorer = PriorityScorer::new(ScorerConfig {
        vip_senders: vec!["ceo@company.com".to_string()],
        client_senders: vec!["client@example.com".to_string()],
        ..ScorerConfig::default()
    });
    let mut task = base_task();
    task.sender = Some("ceo@company.com".to_string());
    assert_eq!(scorer.sender(&task), 5);
    task.sender = Some("client@example.com".to_string());
    assert_eq!(scorer.sender(&task), 4);
    task.sender = Some("rando@nowhere.com".to_string());
    assert_eq!(scorer.sender(&task), 2);
    task.sender = None;
    assert_eq!(scorer.sender(&task), 1);
}

#[test]
fn age_boost_caps_at_two() {
    let now = Utc::now();
    let mut task = base_task();
    task.created_at = now - Duration::days(100);
    assert_eq!(age_boost(&task, now), 2.0);
}

#[test]
fn score_is_pure_for_identical_inputs() {
    let scorer = PriorityScorer::new(ScorerConfig::default());
    let now = Utc::now();
    let task = base_task();
    assert_eq!(scorer.score(&task, now), scorer.score(&task, now));
}
