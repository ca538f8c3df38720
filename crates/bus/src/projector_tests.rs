// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::writer::EventWriter;
use chrono::TimeZone;
use spindle_contract::{Run, RunState, SourceTool, Task};
use tempfile::tempdir;

fn open_writer() -> (tempfile::TempDir, EventStore, EventWriter) {
    let dir = tempdir().unwrap();
    let store = EventStore::open(dir.path().join("events.db")).unwrap();
    let writer = EventWriter::new(store.clone(), SourceTool::Coldwine);
    (dir, store, writer)
}

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
}

fn sample_task(id: &str) -> Task {
    Task {
        id: id.to_string(),
        story_id: Some("STORY-1".to_string()),
        title: "Build the projector".to_string(),
        status: TaskStatus::Todo,
        assignee: None,
        complexity: None,
        source_tool: SourceTool::Coldwine,
        created_at: ts(),
        updated_at: ts(),
    }
}

fn sample_run(id: &str, task_id: &str) -> Run {
    Run {
        id: id.to_string(),
        task_id: task_id.to_string(),
        agent_id: Some("agent-7".to_string()),
        session_ref: Some("sess-7".to_string()),
        state: RunState::Working,
        source_tool: SourceTool::Coldwine,
        created_at: ts(),
        updated_at: ts(),
    }
}

#[test]
fn task_lifecycle_derives_status_and_assignee() {
    let (_dir, store, writer) = open_writer();

    writer.task_created(&sample_task("TASK-1")).unwrap();
    writer.task_assigned("TASK-1", "mara").unwrap();
    let started = writer.task_started("TASK-1").unwrap();

    let state = build_state(&store, &EventFilter::default()).unwrap();
    let task = &state.tasks["TASK-1"];
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.assignee.as_deref(), Some("mara"));
    assert_eq!(task.title, "Build the projector");
    assert_eq!(task.story_id.as_deref(), Some("STORY-1"));
    assert_eq!(task.last_event_id, started.id);
    assert_eq!(task.last_updated, started.created_at);
}

#[test]
fn closed_forces_status_closed() {
    let (_dir, store, writer) = open_writer();

    let initiative = spindle_contract::Initiative {
        id: "INIT-1".to_string(),
        title: "Q1 platform".to_string(),
        status: Status::Open,
        source_tool: SourceTool::Gurgeh,
        created_at: ts(),
        updated_at: ts(),
    };
    writer.initiative_created(&initiative).unwrap();
    writer.initiative_closed("INIT-1", Some("superseded")).unwrap();

    let state = build_state(&store, &EventFilter::default()).unwrap();
    assert_eq!(state.initiatives["INIT-1"].status, Status::Closed);
    assert_eq!(state.initiatives["INIT-1"].title, "Q1 platform");
}

#[test]
fn epic_and_story_track_parent_references() {
    let (_dir, store, writer) = open_writer();

    let epic = spindle_contract::Epic {
        id: "EPIC-1".to_string(),
        initiative_id: Some("INIT-1".to_string()),
        title: "Spine".to_string(),
        status: Status::Open,
        source_tool: SourceTool::Gurgeh,
        created_at: ts(),
        updated_at: ts(),
    };
    let story = spindle_contract::Story {
        id: "STORY-1".to_string(),
        epic_id: Some("EPIC-1".to_string()),
        title: "Watch API".to_string(),
        status: Status::Draft,
        source_tool: SourceTool::Gurgeh,
        created_at: ts(),
        updated_at: ts(),
    };
    writer.epic_created(&epic).unwrap();
    writer.story_created(&story).unwrap();

    let state = build_state(&store, &EventFilter::default()).unwrap();
    assert_eq!(state.epics["EPIC-1"].parent_id.as_deref(), Some("INIT-1"));
    assert_eq!(state.stories["STORY-1"].parent_id.as_deref(), Some("EPIC-1"));
}

#[test]
fn run_events_drive_phase_and_artifacts() {
    let (_dir, store, writer) = open_writer();

    writer.run_started(&sample_run("RUN-1", "TASK-1")).unwrap();
    writer.run_waiting("RUN-1", Some("awaiting review")).unwrap();
    writer.run_artifact_added("RUN-1", "report.md").unwrap();
    writer.run_completed("RUN-1").unwrap();

    writer.run_started(&sample_run("RUN-2", "TASK-2")).unwrap();
    writer.run_failed("RUN-2", Some("compile error")).unwrap();

    let state = build_state(&store, &EventFilter::default()).unwrap();

    let done = &state.runs["RUN-1"];
    assert_eq!(done.phase, RunPhase::Done);
    assert_eq!(done.task_id, "TASK-1");
    assert_eq!(done.agent_id.as_deref(), Some("agent-7"));
    assert_eq!(done.session_ref.as_deref(), Some("sess-7"));
    assert_eq!(done.artifacts, vec!["report.md".to_string()]);

    assert_eq!(state.runs["RUN-2"].phase, RunPhase::Failed);
}

#[test]
fn run_transition_creates_missing_run() {
    let (_dir, store, writer) = open_writer();

    // run_started never observed (e.g. filtered replay window)
    writer.run_failed("RUN-9", None).unwrap();

    let state = build_state(&store, &EventFilter::default()).unwrap();
    assert_eq!(state.runs["RUN-9"].phase, RunPhase::Failed);
    assert_eq!(state.runs["RUN-9"].task_id, "");
}

#[test]
fn signals_do_not_disturb_entity_state() {
    let (_dir, store, writer) = open_writer();

    writer.task_created(&sample_task("TASK-1")).unwrap();
    let before = build_state(&store, &EventFilter::default()).unwrap();

    writer
        .signal_raised(EntityType::Task, "TASK-1", "stale branch")
        .unwrap();
    writer
        .signal_raised(EntityType::Task, "TASK-GHOST", "orphan file")
        .unwrap();

    let after = build_state(&store, &EventFilter::default()).unwrap();
    assert_eq!(after, before);
    assert!(!after.tasks.contains_key("TASK-GHOST"));
}

#[test]
fn fold_is_deterministic_across_runs() {
    let (_dir, store, writer) = open_writer();

    writer.task_created(&sample_task("TASK-1")).unwrap();
    writer.task_started("TASK-1").unwrap();
    writer.run_started(&sample_run("RUN-1", "TASK-1")).unwrap();

    let first = build_state(&store, &EventFilter::default()).unwrap();
    let second = build_state(&store, &EventFilter::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unknown_payload_fields_are_tolerated() {
    let (_dir, store, _writer) = open_writer();

    let mut event = EventRecord::new(
        EventType::TaskCreated,
        EntityType::Task,
        "TASK-1",
        SourceTool::Coldwine,
        serde_json::json!({
            "id": "TASK-1",
            "title": "Tolerant",
            "status": "todo",
            "not_a_known_field": {"deep": true},
        }),
    );
    store.append(&mut event).unwrap();

    let state = build_state(&store, &EventFilter::default()).unwrap();
    assert_eq!(state.tasks["TASK-1"].title, "Tolerant");
}
