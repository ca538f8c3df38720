// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field-level and cross-reference validation.
//!
//! Validators collect issues instead of failing fast so a caller can report
//! every problem in one pass. No validator performs I/O.

use crate::entity::{Epic, Initiative, InsightLink, Outcome, Run, Story, Task};
use crate::EntityType;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub field: &'static str,
    pub message: String,
}

/// Accumulated validation issues for one or more entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(
        &mut self,
        entity_type: EntityType,
        entity_id: &str,
        field: &'static str,
        message: impl Into<String>,
    ) {
        self.issues.push(ValidationIssue {
            entity_type,
            entity_id: entity_id.to_string(),
            field,
            message: message.into(),
        });
    }

    fn merge(&mut self, other: ValidationResult) {
        self.issues.extend(other.issues);
    }
}

fn is_zero(ts: DateTime<Utc>) -> bool {
    ts.timestamp_millis() == 0
}

fn check_common(
    result: &mut ValidationResult,
    entity_type: EntityType,
    id: &str,
    title: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) {
    if id.is_empty() {
        result.push(entity_type, id, "id", "id must not be empty");
    }
    if title.is_empty() {
        result.push(entity_type, id, "title", "title must not be empty");
    }
    if is_zero(created_at) {
        result.push(entity_type, id, "created_at", "timestamp must not be zero");
    }
    if is_zero(updated_at) {
        result.push(entity_type, id, "updated_at", "timestamp must not be zero");
    }
}

pub fn validate_initiative(initiative: &Initiative) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_common(
        &mut result,
        EntityType::Initiative,
        &initiative.id,
        &initiative.title,
        initiative.created_at,
        initiative.updated_at,
    );
    result
}

pub fn validate_epic(epic: &Epic) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_common(
        &mut result,
        EntityType::Epic,
        &epic.id,
        &epic.title,
        epic.created_at,
        epic.updated_at,
    );
    if epic.initiative_id.as_deref() == Some("") {
        result.push(
            EntityType::Epic,
            &epic.id,
            "initiative_id",
            "parent reference must not be empty when present",
        );
    }
    result
}

pub fn validate_story(story: &Story) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_common(
        &mut result,
        EntityType::Story,
        &story.id,
        &story.title,
        story.created_at,
        story.updated_at,
    );
    if story.epic_id.as_deref() == Some("") {
        result.push(
            EntityType::Story,
            &story.id,
            "epic_id",
            "parent reference must not be empty when present",
        );
    }
    result
}

pub fn validate_task(task: &Task) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_common(
        &mut result,
        EntityType::Task,
        &task.id,
        &task.title,
        task.created_at,
        task.updated_at,
    );
    if task.story_id.as_deref() == Some("") {
        result.push(
            EntityType::Task,
            &task.id,
            "story_id",
            "parent reference must not be empty when present",
        );
    }
    result
}

pub fn validate_run(run: &Run) -> ValidationResult {
    let mut result = ValidationResult::default();
    if run.id.is_empty() {
        result.push(EntityType::Run, &run.id, "id", "id must not be empty");
    }
    if run.task_id.is_empty() {
        result.push(
            EntityType::Run,
            &run.id,
            "task_id",
            "run must reference a task",
        );
    }
    if is_zero(run.created_at) {
        result.push(
            EntityType::Run,
            &run.id,
            "created_at",
            "timestamp must not be zero",
        );
    }
    if is_zero(run.updated_at) {
        result.push(
            EntityType::Run,
            &run.id,
            "updated_at",
            "timestamp must not be zero",
        );
    }
    result
}

pub fn validate_outcome(outcome: &Outcome) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_common(
        &mut result,
        EntityType::Outcome,
        &outcome.id,
        &outcome.title,
        outcome.created_at,
        outcome.updated_at,
    );
    if outcome.run_id.as_deref() == Some("") {
        result.push(
            EntityType::Outcome,
            &outcome.id,
            "run_id",
            "parent reference must not be empty when present",
        );
    }
    result
}

pub fn validate_insight_link(link: &InsightLink) -> ValidationResult {
    let mut result = ValidationResult::default();
    if link.id.is_empty() {
        result.push(EntityType::Insight, &link.id, "id", "id must not be empty");
    }
    if link.insight_id.is_empty() {
        result.push(
            EntityType::Insight,
            &link.id,
            "insight_id",
            "insight reference must not be empty",
        );
    }
    if link.entity_id.is_empty() {
        result.push(
            EntityType::Insight,
            &link.id,
            "entity_id",
            "target entity reference must not be empty",
        );
    }
    if is_zero(link.created_at) {
        result.push(
            EntityType::Insight,
            &link.id,
            "created_at",
            "timestamp must not be zero",
        );
    }
    result
}

/// In-memory registry that checks parent references across tools.
///
/// Tools register the entities they own, then call [`CrossToolValidator::validate`]
/// to verify every non-empty parent reference resolves to a registered
/// entity of the correct type.
#[derive(Debug, Default)]
pub struct CrossToolValidator {
    initiatives: HashMap<String, Initiative>,
    epics: HashMap<String, Epic>,
    stories: HashMap<String, Story>,
    tasks: HashMap<String, Task>,
    runs: HashMap<String, Run>,
    outcomes: HashMap<String, Outcome>,
}

impl CrossToolValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_initiative(&mut self, initiative: Initiative) {
        self.initiatives.insert(initiative.id.clone(), initiative);
    }

    pub fn register_epic(&mut self, epic: Epic) {
        self.epics.insert(epic.id.clone(), epic);
    }

    pub fn register_story(&mut self, story: Story) {
        self.stories.insert(story.id.clone(), story);
    }

    pub fn register_task(&mut self, task: Task) {
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn register_run(&mut self, run: Run) {
        self.runs.insert(run.id.clone(), run);
    }

    pub fn register_outcome(&mut self, outcome: Outcome) {
        self.outcomes.insert(outcome.id.clone(), outcome);
    }

    /// Validate every registered entity's fields and parent references.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for initiative in self.initiatives.values() {
            result.merge(validate_initiative(initiative));
        }

        for epic in self.epics.values() {
            result.merge(validate_epic(epic));
            if let Some(parent) = epic.initiative_id.as_deref() {
                if !parent.is_empty() && !self.initiatives.contains_key(parent) {
                    result.push(
                        EntityType::Epic,
                        &epic.id,
                        "initiative_id",
                        format!("unknown initiative '{parent}'"),
                    );
                }
            }
        }

        for story in self.stories.values() {
            result.merge(validate_story(story));
            if let Some(parent) = story.epic_id.as_deref() {
                if !parent.is_empty() && !self.epics.contains_key(parent) {
                    result.push(
                        EntityType::Story,
                        &story.id,
                        "epic_id",
                        format!("unknown epic '{parent}'"),
                    );
                }
            }
        }

        for task in self.tasks.values() {
            result.merge(validate_task(task));
            if let Some(parent) = task.story_id.as_deref() {
                if !parent.is_empty() && !self.stories.contains_key(parent) {
                    result.push(
                        EntityType::Task,
                        &task.id,
                        "story_id",
                        format!("unknown story '{parent}'"),
                    );
                }
            }
        }

        for run in self.runs.values() {
            result.merge(validate_run(run));
            if !run.task_id.is_empty() && !self.tasks.contains_key(&run.task_id) {
                result.push(
                    EntityType::Run,
                    &run.id,
                    "task_id",
                    format!("unknown task '{}'", run.task_id),
                );
            }
        }

        for outcome in self.outcomes.values() {
            result.merge(validate_outcome(outcome));
            if let Some(parent) = outcome.run_id.as_deref() {
                if !parent.is_empty() && !self.runs.contains_key(parent) {
                    result.push(
                        EntityType::Outcome,
                        &outcome.id,
                        "run_id",
                        format!("unknown run '{parent}'"),
                    );
                }
            }
        }

        result
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
