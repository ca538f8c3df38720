// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Projector: fold the event log into current entity state.
//!
//! The fold is deterministic — the same event prefix always produces the
//! same state maps. Payloads are read tolerantly: the projector interprets
//! a narrow set of fields (`title`, `status`, parent ids, `assignee`,
//! agent identifiers) and ignores everything else, so payload additions
//! never break replay.

use chrono::{DateTime, Utc};
use spindle_contract::{
    EntityType, EventFilter, EventRecord, EventType, Status, TaskStatus,
};
use spindle_store::{EventStore, StorageError};
use std::collections::HashMap;
use std::fmt;

/// Projected state of a run.
///
/// Extends the wire-level `RunState` set with a terminal `failed`: the
/// log records `run_failed` and the projection has to land it somewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Working,
    Waiting,
    Blocked,
    Done,
    Failed,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Working => "working",
            RunPhase::Waiting => "waiting",
            RunPhase::Blocked => "blocked",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current state of a workflow entity (initiative, epic, or story).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItemView {
    pub id: String,
    pub title: String,
    pub status: Status,
    /// Parent reference: initiative for epics, epic for stories
    pub parent_id: Option<String>,
    pub last_event_id: i64,
    pub last_updated: DateTime<Utc>,
}

/// Current state of a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub story_id: Option<String>,
    pub assignee: Option<String>,
    pub last_event_id: i64,
    pub last_updated: DateTime<Utc>,
}

/// Current state of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunView {
    pub id: String,
    pub task_id: String,
    pub agent_id: Option<String>,
    pub session_ref: Option<String>,
    pub phase: RunPhase,
    pub artifacts: Vec<String>,
    pub last_event_id: i64,
    pub last_updated: DateTime<Utc>,
}

/// Entity state maps folded from the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectState {
    pub initiatives: HashMap<String, WorkItemView>,
    pub epics: HashMap<String, WorkItemView>,
    pub stories: HashMap<String, WorkItemView>,
    pub tasks: HashMap<String, TaskView>,
    pub runs: HashMap<String, RunView>,
}

impl ProjectState {
    /// Fold one event into the state. Unknown entity types are ignored.
    pub fn apply(&mut self, event: &EventRecord) {
        // Signals annotate entities without changing their state
        if matches!(
            event.event_type,
            EventType::SignalRaised | EventType::SignalDismissed
        ) {
            return;
        }
        match event.entity_type {
            EntityType::Initiative => {
                apply_work_item(&mut self.initiatives, event, None);
            }
            EntityType::Epic => {
                apply_work_item(&mut self.epics, event, Some("initiative_id"));
            }
            EntityType::Story => {
                apply_work_item(&mut self.stories, event, Some("epic_id"));
            }
            EntityType::Task => apply_task(&mut self.tasks, event),
            EntityType::Run => apply_run(&mut self.runs, event),
            // Specs, outcomes, and insights have no projected state
            EntityType::Spec | EntityType::Outcome | EntityType::Insight => {}
        }
    }
}

/// Replay all events matching `filter` through a fresh [`ProjectState`].
pub fn build_state(
    store: &EventStore,
    filter: &EventFilter,
) -> Result<ProjectState, StorageError> {
    let mut state = ProjectState::default();
    store.replay(0, filter, |event| {
        state.apply(event);
        Ok(())
    })?;
    Ok(state)
}

fn str_field(event: &EventRecord, field: &str) -> Option<String> {
    event.payload.get(field)?.as_str().map(String::from)
}

fn touch(last_event_id: &mut i64, last_updated: &mut DateTime<Utc>, event: &EventRecord) {
    *last_event_id = event.id;
    *last_updated = event.created_at;
}

fn apply_work_item(
    items: &mut HashMap<String, WorkItemView>,
    event: &EventRecord,
    parent_field: Option<&str>,
) {
    let item = items
        .entry(event.entity_id.clone())
        .or_insert_with(|| WorkItemView {
            id: event.entity_id.clone(),
            title: String::new(),
            status: Status::Draft,
            parent_id: None,
            last_event_id: 0,
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
        });

    match event.event_type {
        EventType::InitiativeCreated
        | EventType::InitiativeUpdated
        | EventType::EpicCreated
        | EventType::EpicUpdated
        | EventType::StoryCreated
        | EventType::StoryUpdated => {
            if let Some(title) = str_field(event, "title") {
                item.title = title;
            }
            if let Some(status) = str_field(event, "status").and_then(|s| Status::parse(&s)) {
                item.status = status;
            }
            if let Some(field) = parent_field {
                if let Some(parent) = str_field(event, field) {
                    item.parent_id = Some(parent);
                }
            }
        }
        EventType::InitiativeClosed | EventType::EpicClosed | EventType::StoryClosed => {
            item.status = Status::Closed;
        }
        _ => {}
    }
    touch(&mut item.last_event_id, &mut item.last_updated, event);
}

fn apply_task(tasks: &mut HashMap<String, TaskView>, event: &EventRecord) {
    let task = tasks
        .entry(event.entity_id.clone())
        .or_insert_with(|| TaskView {
            id: event.entity_id.clone(),
            title: String::new(),
            status: TaskStatus::Todo,
            story_id: None,
            assignee: None,
            last_event_id: 0,
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
        });

    match event.event_type {
        EventType::TaskCreated => {
            if let Some(title) = str_field(event, "title") {
                task.title = title;
            }
            if let Some(status) = str_field(event, "status").and_then(|s| TaskStatus::parse(&s)) {
                task.status = status;
            }
            if let Some(story_id) = str_field(event, "story_id") {
                task.story_id = Some(story_id);
            }
            if let Some(assignee) = str_field(event, "assignee") {
                task.assignee = Some(assignee);
            }
        }
        EventType::TaskAssigned => {
            if let Some(assignee) = str_field(event, "assignee") {
                task.assignee = Some(assignee);
            }
        }
        EventType::TaskStarted => task.status = TaskStatus::InProgress,
        EventType::TaskBlocked => task.status = TaskStatus::Blocked,
        EventType::TaskCompleted => task.status = TaskStatus::Done,
        _ => {}
    }
    touch(&mut task.last_event_id, &mut task.last_updated, event);
}

fn apply_run(runs: &mut HashMap<String, RunView>, event: &EventRecord) {
    let run = runs.entry(event.entity_id.clone()).or_insert_with(|| RunView {
        id: event.entity_id.clone(),
        task_id: String::new(),
        agent_id: None,
        session_ref: None,
        phase: RunPhase::Working,
        artifacts: Vec::new(),
        last_event_id: 0,
        last_updated: DateTime::<Utc>::UNIX_EPOCH,
    });

    match event.event_type {
        EventType::RunStarted => {
            if let Some(task_id) = str_field(event, "task_id") {
                run.task_id = task_id;
            }
            if let Some(agent_id) = str_field(event, "agent_id") {
                run.agent_id = Some(agent_id);
            }
            if let Some(session_ref) = str_field(event, "session_ref") {
                run.session_ref = Some(session_ref);
            }
            run.phase = RunPhase::Working;
        }
        EventType::RunWaiting => run.phase = RunPhase::Waiting,
        EventType::RunCompleted => run.phase = RunPhase::Done,
        EventType::RunFailed => run.phase = RunPhase::Failed,
        EventType::RunArtifactAdded => {
            if let Some(artifact) = str_field(event, "artifact") {
                run.artifacts.push(artifact);
            }
        }
        _ => {}
    }
    touch(&mut run.last_event_id, &mut run.last_updated, event);
}

#[cfg(test)]
#[path = "projector_tests.rs"]
mod tests;
