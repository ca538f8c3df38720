// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed event emitters.
//!
//! A writer binds a store handle, a source tool tag, and an optional
//! default project path. Every emitter serializes its payload, appends to
//! the store, and only then fans out to subscribers — an append failure
//! returns before any subscriber can observe the event.

use crate::subscribe::SubscriberRegistry;
use spindle_contract::{
    EntityType, Epic, EventRecord, EventType, Initiative, InsightLink, Outcome, Run, SourceTool,
    Story, Task,
};
use spindle_store::{EventStore, StorageError};
use tracing::debug;

/// Writer half of the bus for one source tool.
#[derive(Clone)]
pub struct EventWriter {
    store: EventStore,
    source_tool: SourceTool,
    project_path: Option<String>,
    subscribers: SubscriberRegistry,
}

impl EventWriter {
    pub fn new(store: EventStore, source_tool: SourceTool) -> Self {
        Self {
            store,
            source_tool,
            project_path: None,
            subscribers: SubscriberRegistry::new(),
        }
    }

    /// Scope all emitted events to a project root.
    pub fn with_project(mut self, project_path: impl Into<String>) -> Self {
        self.project_path = Some(project_path.into());
        self
    }

    /// Share a subscriber registry (typically with an [`crate::EventReader`]).
    pub fn with_subscribers(mut self, subscribers: SubscriberRegistry) -> Self {
        self.subscribers = subscribers;
        self
    }

    pub fn source_tool(&self) -> SourceTool {
        self.source_tool
    }

    /// Append one event and fan out. The returned record carries the
    /// assigned id and timestamp.
    ///
    /// This is the primitive the typed emitters build on; callers deriving
    /// events from observed file state use it directly.
    pub fn emit(
        &self,
        event_type: EventType,
        entity_type: EntityType,
        entity_id: &str,
        payload: serde_json::Value,
    ) -> Result<EventRecord, StorageError> {
        let mut event = EventRecord::new(
            event_type,
            entity_type,
            entity_id,
            self.source_tool,
            payload,
        );
        event.project_path = self.project_path.clone();

        self.store.append(&mut event)?;
        self.subscribers.fan_out(&event);
        debug!(id = event.id, event_type = %event.event_type, "emitted");
        Ok(event)
    }

    fn emit_entity<T: serde::Serialize>(
        &self,
        event_type: EventType,
        entity_type: EntityType,
        entity_id: &str,
        entity: &T,
    ) -> Result<EventRecord, StorageError> {
        let payload = serde_json::to_value(entity)?;
        self.emit(event_type, entity_type, entity_id, payload)
    }

    // -- initiative --

    pub fn initiative_created(&self, initiative: &Initiative) -> Result<EventRecord, StorageError> {
        self.emit_entity(
            EventType::InitiativeCreated,
            EntityType::Initiative,
            &initiative.id,
            initiative,
        )
    }

    pub fn initiative_updated(&self, initiative: &Initiative) -> Result<EventRecord, StorageError> {
        self.emit_entity(
            EventType::InitiativeUpdated,
            EntityType::Initiative,
            &initiative.id,
            initiative,
        )
    }

    pub fn initiative_closed(
        &self,
        initiative_id: &str,
        reason: Option<&str>,
    ) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::InitiativeClosed,
            EntityType::Initiative,
            initiative_id,
            transition_payload("initiative_id", initiative_id, reason),
        )
    }

    // -- epic --

    pub fn epic_created(&self, epic: &Epic) -> Result<EventRecord, StorageError> {
        self.emit_entity(EventType::EpicCreated, EntityType::Epic, &epic.id, epic)
    }

    pub fn epic_updated(&self, epic: &Epic) -> Result<EventRecord, StorageError> {
        self.emit_entity(EventType::EpicUpdated, EntityType::Epic, &epic.id, epic)
    }

    pub fn epic_closed(
        &self,
        epic_id: &str,
        reason: Option<&str>,
    ) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::EpicClosed,
            EntityType::Epic,
            epic_id,
            transition_payload("epic_id", epic_id, reason),
        )
    }

    // -- story --

    pub fn story_created(&self, story: &Story) -> Result<EventRecord, StorageError> {
        self.emit_entity(EventType::StoryCreated, EntityType::Story, &story.id, story)
    }

    pub fn story_updated(&self, story: &Story) -> Result<EventRecord, StorageError> {
        self.emit_entity(EventType::StoryUpdated, EntityType::Story, &story.id, story)
    }

    pub fn story_closed(
        &self,
        story_id: &str,
        reason: Option<&str>,
    ) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::StoryClosed,
            EntityType::Story,
            story_id,
            transition_payload("story_id", story_id, reason),
        )
    }

    // -- task --

    pub fn task_created(&self, task: &Task) -> Result<EventRecord, StorageError> {
        self.emit_entity(EventType::TaskCreated, EntityType::Task, &task.id, task)
    }

    pub fn task_assigned(
        &self,
        task_id: &str,
        assignee: &str,
    ) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::TaskAssigned,
            EntityType::Task,
            task_id,
            serde_json::json!({"task_id": task_id, "assignee": assignee}),
        )
    }

    pub fn task_started(&self, task_id: &str) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::TaskStarted,
            EntityType::Task,
            task_id,
            transition_payload("task_id", task_id, None),
        )
    }

    pub fn task_blocked(
        &self,
        task_id: &str,
        reason: Option<&str>,
    ) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::TaskBlocked,
            EntityType::Task,
            task_id,
            transition_payload("task_id", task_id, reason),
        )
    }

    pub fn task_completed(&self, task_id: &str) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::TaskCompleted,
            EntityType::Task,
            task_id,
            transition_payload("task_id", task_id, None),
        )
    }

    // -- run --

    pub fn run_started(&self, run: &Run) -> Result<EventRecord, StorageError> {
        self.emit_entity(EventType::RunStarted, EntityType::Run, &run.id, run)
    }

    pub fn run_waiting(
        &self,
        run_id: &str,
        reason: Option<&str>,
    ) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::RunWaiting,
            EntityType::Run,
            run_id,
            transition_payload("run_id", run_id, reason),
        )
    }

    pub fn run_completed(&self, run_id: &str) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::RunCompleted,
            EntityType::Run,
            run_id,
            transition_payload("run_id", run_id, None),
        )
    }

    pub fn run_failed(
        &self,
        run_id: &str,
        reason: Option<&str>,
    ) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::RunFailed,
            EntityType::Run,
            run_id,
            transition_payload("run_id", run_id, reason),
        )
    }

    pub fn run_artifact_added(
        &self,
        run_id: &str,
        artifact: &str,
    ) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::RunArtifactAdded,
            EntityType::Run,
            run_id,
            serde_json::json!({"run_id": run_id, "artifact": artifact}),
        )
    }

    // -- outcome / insight --

    pub fn outcome_recorded(&self, outcome: &Outcome) -> Result<EventRecord, StorageError> {
        self.emit_entity(
            EventType::OutcomeRecorded,
            EntityType::Outcome,
            &outcome.id,
            outcome,
        )
    }

    pub fn insight_linked(&self, link: &InsightLink) -> Result<EventRecord, StorageError> {
        self.emit_entity(EventType::InsightLinked, EntityType::Insight, &link.id, link)
    }

    // -- spec --

    /// Record a spec file revision. The payload is the parsed descriptor
    /// the reconciler observed on disk.
    pub fn spec_revised(
        &self,
        spec_id: &str,
        payload: serde_json::Value,
    ) -> Result<EventRecord, StorageError> {
        self.emit(EventType::SpecRevised, EntityType::Spec, spec_id, payload)
    }

    // -- signal --

    /// Raise a signal about an entity.
    pub fn signal_raised(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        reason: &str,
    ) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::SignalRaised,
            entity_type,
            entity_id,
            serde_json::json!({"entity_id": entity_id, "reason": reason}),
        )
    }

    pub fn signal_dismissed(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<EventRecord, StorageError> {
        self.emit(
            EventType::SignalDismissed,
            entity_type,
            entity_id,
            serde_json::json!({"entity_id": entity_id}),
        )
    }
}

/// `{"<key>": id}` with an optional `reason`.
fn transition_payload(key: &str, id: &str, reason: Option<&str>) -> serde_json::Value {
    let mut payload = serde_json::json!({ key: id });
    if let Some(reason) = reason {
        payload["reason"] = serde_json::Value::String(reason.to_string());
    }
    payload
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
