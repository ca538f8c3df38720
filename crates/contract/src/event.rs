// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event record, closed event/entity vocabularies, and the query filter.
//!
//! An [`EventRecord`] is the unit of the event spine: an append-only row
//! whose `payload` is an opaque JSON bag the store never interprets. Tags
//! serialize as `lowercase_underscore` strings and must stay bit-exact —
//! they are persisted in every row.

use crate::status::SourceTool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of event type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    InitiativeCreated,
    InitiativeUpdated,
    InitiativeClosed,
    EpicCreated,
    EpicUpdated,
    EpicClosed,
    StoryCreated,
    StoryUpdated,
    StoryClosed,
    TaskCreated,
    TaskAssigned,
    TaskStarted,
    TaskBlocked,
    TaskCompleted,
    RunStarted,
    RunWaiting,
    RunCompleted,
    RunFailed,
    RunArtifactAdded,
    OutcomeRecorded,
    SpecRevised,
    InsightLinked,
    SignalRaised,
    SignalDismissed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::InitiativeCreated => "initiative_created",
            EventType::InitiativeUpdated => "initiative_updated",
            EventType::InitiativeClosed => "initiative_closed",
            EventType::EpicCreated => "epic_created",
            EventType::EpicUpdated => "epic_updated",
            EventType::EpicClosed => "epic_closed",
            EventType::StoryCreated => "story_created",
            EventType::StoryUpdated => "story_updated",
            EventType::StoryClosed => "story_closed",
            EventType::TaskCreated => "task_created",
            EventType::TaskAssigned => "task_assigned",
            EventType::TaskStarted => "task_started",
            EventType::TaskBlocked => "task_blocked",
            EventType::TaskCompleted => "task_completed",
            EventType::RunStarted => "run_started",
            EventType::RunWaiting => "run_waiting",
            EventType::RunCompleted => "run_completed",
            EventType::RunFailed => "run_failed",
            EventType::RunArtifactAdded => "run_artifact_added",
            EventType::OutcomeRecorded => "outcome_recorded",
            EventType::SpecRevised => "spec_revised",
            EventType::InsightLinked => "insight_linked",
            EventType::SignalRaised => "signal_raised",
            EventType::SignalDismissed => "signal_dismissed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initiative_created" => Some(EventType::InitiativeCreated),
            "initiative_updated" => Some(EventType::InitiativeUpdated),
            "initiative_closed" => Some(EventType::InitiativeClosed),
            "epic_created" => Some(EventType::EpicCreated),
            "epic_updated" => Some(EventType::EpicUpdated),
            "epic_closed" => Some(EventType::EpicClosed),
            "story_created" => Some(EventType::StoryCreated),
            "story_updated" => Some(EventType::StoryUpdated),
            "story_closed" => Some(EventType::StoryClosed),
            "task_created" => Some(EventType::TaskCreated),
            "task_assigned" => Some(EventType::TaskAssigned),
            "task_started" => Some(EventType::TaskStarted),
            "task_blocked" => Some(EventType::TaskBlocked),
            "task_completed" => Some(EventType::TaskCompleted),
            "run_started" => Some(EventType::RunStarted),
            "run_waiting" => Some(EventType::RunWaiting),
            "run_completed" => Some(EventType::RunCompleted),
            "run_failed" => Some(EventType::RunFailed),
            "run_artifact_added" => Some(EventType::RunArtifactAdded),
            "outcome_recorded" => Some(EventType::OutcomeRecorded),
            "spec_revised" => Some(EventType::SpecRevised),
            "insight_linked" => Some(EventType::InsightLinked),
            "signal_raised" => Some(EventType::SignalRaised),
            "signal_dismissed" => Some(EventType::SignalDismissed),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of entity type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Initiative,
    Epic,
    Story,
    Task,
    Run,
    Outcome,
    Spec,
    Insight,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Initiative => "initiative",
            EntityType::Epic => "epic",
            EntityType::Story => "story",
            EntityType::Task => "task",
            EntityType::Run => "run",
            EntityType::Outcome => "outcome",
            EntityType::Spec => "spec",
            EntityType::Insight => "insight",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initiative" => Some(EntityType::Initiative),
            "epic" => Some(EntityType::Epic),
            "story" => Some(EntityType::Story),
            "task" => Some(EntityType::Task),
            "run" => Some(EntityType::Run),
            "outcome" => Some(EntityType::Outcome),
            "spec" => Some(EntityType::Spec),
            "insight" => Some(EntityType::Insight),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the event spine.
///
/// `id` is assigned by the store at append; `payload` is opaque JSON the
/// store never inspects. A `created_at` equal to the Unix epoch means
/// "unstamped" and is filled in at append time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonically increasing row id, 0 until appended
    #[serde(default)]
    pub id: i64,
    pub event_type: EventType,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub source_tool: SourceTool,
    pub payload: serde_json::Value,
    /// Project root this event is scoped to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Build an unstamped record; the store assigns `id` and `created_at`.
    pub fn new(
        event_type: EventType,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        source_tool: SourceTool,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: 0,
            event_type,
            entity_type,
            entity_id: entity_id.into(),
            source_tool,
            payload,
            project_path: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn with_project(mut self, project_path: impl Into<String>) -> Self {
        self.project_path = Some(project_path.into());
        self
    }

    /// True when `created_at` is still the epoch sentinel.
    pub fn is_unstamped(&self) -> bool {
        self.created_at.timestamp_millis() == 0
    }
}

/// Query filter over the event spine.
///
/// Empty vectors match everything; the time window is `[since, until)`.
/// `limit`/`offset` apply to store queries only and are ignored by
/// [`EventFilter::matches`].
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub event_types: Vec<EventType>,
    pub entity_types: Vec<EntityType>,
    pub entity_ids: Vec<String>,
    pub source_tools: Vec<SourceTool>,
    pub project_path: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl EventFilter {
    /// In-process predicate used for subscriber fan-out.
    pub fn matches(&self, event: &EventRecord) -> bool {
        if !self.event_types.is_empty() && !self.event_types.contains(&event.event_type) {
            return false;
        }
        if !self.entity_types.is_empty() && !self.entity_types.contains(&event.entity_type) {
            return false;
        }
        if !self.entity_ids.is_empty() && !self.entity_ids.iter().any(|id| *id == event.entity_id)
        {
            return false;
        }
        if !self.source_tools.is_empty() && !self.source_tools.contains(&event.source_tool) {
            return false;
        }
        if let Some(project) = &self.project_path {
            if event.project_path.as_deref() != Some(project.as_str()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.created_at >= until {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
