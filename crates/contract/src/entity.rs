// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical entity shapes exchanged between the workbench tools.
//!
//! Field names here are the payload schema for creation events: entities
//! serialize to snake_case JSON and that JSON is what lands in the event
//! spine. Parent references are plain string ids resolved lazily by the
//! [`crate::validate::CrossToolValidator`].

use crate::status::{Complexity, RunState, SourceTool, Status, TaskStatus};
use crate::EntityType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level planning entity owned by the authoring tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub source_tool: SourceTool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A body of work under an initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epic {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative_id: Option<String>,
    pub title: String,
    pub status: Status,
    pub source_tool: SourceTool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user-facing slice of an epic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    pub title: String,
    pub status: Status,
    pub source_tool: SourceTool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An executable unit of work owned by the execution tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    pub source_tool: SourceTool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One agent execution attempt against a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub task_id: String,
    /// Identifier of the spawned agent, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Session reference (terminal/multiplexer handle) for the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_ref: Option<String>,
    pub state: RunState,
    pub source_tool: SourceTool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Recorded result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub title: String,
    pub status: Status,
    pub source_tool: SourceTool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Relation attaching a research insight to another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightLink {
    pub id: String,
    /// Insight being linked
    pub insight_id: String,
    /// Entity the insight is attached to
    pub entity_type: EntityType,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub source_tool: SourceTool,
    pub created_at: DateTime<Utc>,
}
