// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn record(event_type: EventType, entity_type: EntityType, entity_id: &str) -> EventRecord {
    let mut event = EventRecord::new(
        event_type,
        entity_type,
        entity_id,
        SourceTool::Coldwine,
        serde_json::json!({"task_id": entity_id}),
    );
    event.created_at = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
    event
}

#[test]
fn every_event_tag_round_trips() {
    let tags = [
        "initiative_created",
        "initiative_updated",
        "initiative_closed",
        "epic_created",
        "epic_updated",
        "epic_closed",
        "story_created",
        "story_updated",
        "story_closed",
        "task_created",
        "task_assigned",
        "task_started",
        "task_blocked",
        "task_completed",
        "run_started",
        "run_waiting",
        "run_completed",
        "run_failed",
        "run_artifact_added",
        "outcome_recorded",
        "spec_revised",
        "insight_linked",
        "signal_raised",
        "signal_dismissed",
    ];
    for tag in tags {
        let parsed = EventType::parse(tag).unwrap_or_else(|| panic!("tag {tag} should parse"));
        assert_eq!(parsed.as_str(), tag);
    }
    assert_eq!(EventType::parse("task_deleted"), None);
}

#[test]
fn every_entity_tag_round_trips() {
    for tag in [
        "initiative", "epic", "story", "task", "run", "outcome", "spec", "insight",
    ] {
        let parsed = EntityType::parse(tag).unwrap_or_else(|| panic!("tag {tag} should parse"));
        assert_eq!(parsed.as_str(), tag);
    }
    assert_eq!(EntityType::parse("signal"), None);
}

#[test]
fn new_record_is_unstamped() {
    let event = EventRecord::new(
        EventType::TaskCreated,
        EntityType::Task,
        "TASK-1",
        SourceTool::Coldwine,
        serde_json::Value::Null,
    );
    assert!(event.is_unstamped());
    assert_eq!(event.id, 0);
    assert_eq!(event.project_path, None);
}

#[test]
fn record_serde_uses_snake_case_tags() {
    let event = record(EventType::TaskStarted, EntityType::Task, "TASK-1");
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event_type"], "task_started");
    assert_eq!(json["entity_type"], "task");
    assert_eq!(json["source_tool"], "coldwine");

    let back: EventRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn empty_filter_matches_everything() {
    let filter = EventFilter::default();
    assert!(filter.matches(&record(EventType::TaskCreated, EntityType::Task, "T-1")));
    assert!(filter.matches(&record(EventType::SpecRevised, EntityType::Spec, "PRD-1")));
}

#[test]
fn filter_subsets_by_type_and_entity() {
    let filter = EventFilter {
        event_types: vec![EventType::TaskStarted, EventType::TaskBlocked],
        entity_ids: vec!["T-1".to_string()],
        ..Default::default()
    };
    assert!(filter.matches(&record(EventType::TaskStarted, EntityType::Task, "T-1")));
    assert!(!filter.matches(&record(EventType::TaskCreated, EntityType::Task, "T-1")));
    assert!(!filter.matches(&record(EventType::TaskStarted, EntityType::Task, "T-2")));
}

#[test]
fn filter_project_path_requires_exact_match() {
    let filter = EventFilter {
        project_path: Some("/work/alpha".to_string()),
        ..Default::default()
    };
    let mut event = record(EventType::TaskCreated, EntityType::Task, "T-1");
    assert!(!filter.matches(&event), "unscoped event should not match");
    event.project_path = Some("/work/alpha".to_string());
    assert!(filter.matches(&event));
    event.project_path = Some("/work/beta".to_string());
    assert!(!filter.matches(&event));
}

#[test]
fn filter_time_window_is_half_open() {
    let since = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
    let until = Utc.with_ymd_and_hms(2026, 1, 15, 13, 0, 0).unwrap();
    let filter = EventFilter {
        since: Some(since),
        until: Some(until),
        ..Default::default()
    };

    let mut event = record(EventType::TaskCreated, EntityType::Task, "T-1");
    event.created_at = since;
    assert!(filter.matches(&event), "since bound is inclusive");
    event.created_at = until;
    assert!(!filter.matches(&event), "until bound is exclusive");
}
