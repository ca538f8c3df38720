// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reconcile pass: compare files to cursors, emit or record conflicts.
//!
//! Per-file failures (unreadable, unparseable) are logged and skipped so a
//! single bad file never halts a pass. Storage failures abort — without
//! the store there is nothing to reconcile against.
//!
//! Within one entity the order is creation event, then status transition.
//! Across entities the order follows the sorted directory listing; callers
//! needing a global order must not run two passes over the same root
//! concurrently.

use crate::files::{self, SpecDoc, TaskDoc};
use chrono::{DateTime, Utc};
use spindle_bus::{EventWriter, SubscriberRegistry};
use spindle_contract::{EntityType, EventType, SourceTool};
use spindle_store::{
    ConflictReason, CursorStore, EventStore, ReconcileConflict, ReconcileCursor, StorageError,
};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Task statuses treated as terminal on disk.
const TERMINAL_TASK_STATUSES: [&str; 2] = ["done", "completed"];

/// Errors that abort a reconcile pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Counts from one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Spec files read and parsed
    pub specs_seen: usize,
    /// Events emitted for spec files
    pub spec_events: usize,
    /// Task files read and parsed
    pub tasks_seen: usize,
    /// Events emitted for task files
    pub task_events: usize,
    /// Conflicts recorded
    pub conflicts: usize,
}

/// Reconciliation engine over one event store.
///
/// Spec-file events are attributed to the authoring tool, task-file events
/// to the execution tool. One reconciler may serve many projects, but a
/// single `root` must not be reconciled concurrently.
pub struct Reconciler {
    cursors: CursorStore,
    spec_writer: EventWriter,
    task_writer: EventWriter,
    spec_dir: String,
    task_dir: String,
}

impl Reconciler {
    pub fn new(store: EventStore) -> Self {
        Self {
            cursors: CursorStore::new(&store),
            spec_writer: EventWriter::new(store.clone(), SourceTool::Gurgeh),
            task_writer: EventWriter::new(store, SourceTool::Coldwine),
            spec_dir: "specs".to_string(),
            task_dir: "tasks".to_string(),
        }
    }

    /// Override the conventional subdirectory names.
    pub fn with_dirs(mut self, spec_dir: impl Into<String>, task_dir: impl Into<String>) -> Self {
        self.spec_dir = spec_dir.into();
        self.task_dir = task_dir.into();
        self
    }

    /// Fan derived events out to in-process subscribers as well.
    pub fn with_subscribers(mut self, subscribers: SubscriberRegistry) -> Self {
        self.spec_writer = self.spec_writer.with_subscribers(subscribers.clone());
        self.task_writer = self.task_writer.with_subscribers(subscribers);
        self
    }

    /// Walk the project's spec and task directories and reconcile each file.
    pub fn reconcile_project(&self, root: &Path) -> Result<ReconcileSummary, ReconcileError> {
        let project = root.to_string_lossy().into_owned();
        let spec_writer = self.spec_writer.clone().with_project(&project);
        let task_writer = self.task_writer.clone().with_project(&project);
        let mut summary = ReconcileSummary::default();

        for path in files::yaml_files(&root.join(&self.spec_dir)) {
            self.reconcile_spec_file(&project, &path, &spec_writer, &mut summary)?;
        }
        for path in files::yaml_files(&root.join(&self.task_dir)) {
            self.reconcile_task_file(&project, &path, &task_writer, &mut summary)?;
        }

        info!(
            project = %project,
            specs_seen = summary.specs_seen,
            spec_events = summary.spec_events,
            tasks_seen = summary.tasks_seen,
            task_events = summary.task_events,
            conflicts = summary.conflicts,
            "reconcile pass complete"
        );
        Ok(summary)
    }

    fn reconcile_spec_file(
        &self,
        project: &str,
        path: &Path,
        writer: &EventWriter,
        summary: &mut ReconcileSummary,
    ) -> Result<(), ReconcileError> {
        let Some((raw, fingerprint, mtime)) = read_file(path) else {
            return Ok(());
        };
        let doc: SpecDoc = match serde_yaml::from_slice(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unparseable spec file");
                return Ok(());
            }
        };
        summary.specs_seen += 1;

        let id = files::resolve_id(&doc.id, path);
        let status = doc.status.to_lowercase();
        let version = doc.version;

        let cursor = self.cursors.get(project, EntityType::Spec, &id)?;
        match cursor {
            Some(cursor) if cursor.fingerprint == fingerprint => {
                debug!(file = %path.display(), "spec unchanged");
                Ok(())
            }
            Some(cursor) => {
                if let Some((reason, details)) =
                    spec_conflict(path, &cursor, &fingerprint, version, mtime)
                {
                    self.record_conflict(project, EntityType::Spec, &id, reason, details, summary)?;
                    return Ok(());
                }
                writer.spec_revised(&id, spec_payload(&doc, &id))?;
                summary.spec_events += 1;
                self.upsert_cursor(project, EntityType::Spec, &id, &fingerprint, &status, version, mtime)?;
                Ok(())
            }
            None => {
                writer.spec_revised(&id, spec_payload(&doc, &id))?;
                summary.spec_events += 1;
                self.upsert_cursor(project, EntityType::Spec, &id, &fingerprint, &status, version, mtime)?;
                Ok(())
            }
        }
    }

    fn reconcile_task_file(
        &self,
        project: &str,
        path: &Path,
        writer: &EventWriter,
        summary: &mut ReconcileSummary,
    ) -> Result<(), ReconcileError> {
        let Some((raw, fingerprint, mtime)) = read_file(path) else {
            return Ok(());
        };
        let doc: TaskDoc = match serde_yaml::from_slice(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unparseable task file");
                return Ok(());
            }
        };
        summary.tasks_seen += 1;

        let id = files::resolve_id(&doc.id, path);
        let status = doc.status.to_lowercase();

        let cursor = self.cursors.get(project, EntityType::Task, &id)?;
        match cursor {
            Some(cursor) if cursor.fingerprint == fingerprint => {
                debug!(file = %path.display(), "task unchanged");
                Ok(())
            }
            Some(cursor) => {
                let leaving_terminal = TERMINAL_TASK_STATUSES.contains(&cursor.status.as_str())
                    && !TERMINAL_TASK_STATUSES.contains(&status.as_str());
                if leaving_terminal {
                    let details = serde_json::json!({
                        "file": path.display().to_string(),
                        "prev_status": cursor.status,
                        "next_status": status,
                    });
                    self.record_conflict(
                        project,
                        EntityType::Task,
                        &id,
                        ConflictReason::TaskStatusRegression,
                        details,
                        summary,
                    )?;
                    return Ok(());
                }
                if status != cursor.status && self.emit_task_transition(writer, &id, &status, &doc)?
                {
                    summary.task_events += 1;
                }
                self.upsert_cursor(project, EntityType::Task, &id, &fingerprint, &status, 0, mtime)?;
                Ok(())
            }
            None => {
                writer.emit(
                    EventType::TaskCreated,
                    EntityType::Task,
                    &id,
                    task_payload(&doc, &id),
                )?;
                summary.task_events += 1;
                if self.emit_task_transition(writer, &id, &status, &doc)? {
                    summary.task_events += 1;
                }
                self.upsert_cursor(project, EntityType::Task, &id, &fingerprint, &status, 0, mtime)?;
                Ok(())
            }
        }
    }

    /// Emit the transition event matching a task status, if any.
    fn emit_task_transition(
        &self,
        writer: &EventWriter,
        id: &str,
        status: &str,
        doc: &TaskDoc,
    ) -> Result<bool, StorageError> {
        match status {
            "in_progress" => {
                writer.task_started(id)?;
                Ok(true)
            }
            "blocked" => {
                writer.task_blocked(id, doc.block_reason.as_deref())?;
                Ok(true)
            }
            "done" | "completed" => {
                writer.task_completed(id)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn record_conflict(
        &self,
        project: &str,
        entity_type: EntityType,
        entity_id: &str,
        reason: ConflictReason,
        details: serde_json::Value,
        summary: &mut ReconcileSummary,
    ) -> Result<(), StorageError> {
        warn!(
            entity_type = %entity_type,
            entity_id = %entity_id,
            reason = %reason,
            "reconcile conflict"
        );
        let mut conflict =
            ReconcileConflict::new(project, entity_type, entity_id, reason, details);
        self.cursors.log_conflict(&mut conflict)?;
        summary.conflicts += 1;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn upsert_cursor(
        &self,
        project: &str,
        entity_type: EntityType,
        entity_id: &str,
        fingerprint: &str,
        status: &str,
        version: i64,
        mtime: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.cursors.upsert(&ReconcileCursor {
            project_path: project.to_string(),
            entity_type,
            entity_id: entity_id.to_string(),
            fingerprint: fingerprint.to_string(),
            status: status.to_string(),
            version,
            updated_at: mtime,
        })
    }
}

/// Read a file and fingerprint it, skipping (with a warning) on IO errors.
fn read_file(path: &Path) -> Option<(Vec<u8>, String, DateTime<Utc>)> {
    match std::fs::read(path) {
        Ok(raw) => {
            let fingerprint = files::fingerprint(&raw);
            let mtime = files::file_mtime(path);
            Some((raw, fingerprint, mtime))
        }
        Err(e) => {
            warn!(file = %path.display(), error = %e, "skipping unreadable file");
            None
        }
    }
}

/// Spec descriptor as an event payload, with the resolved id filled in.
fn spec_payload(doc: &SpecDoc, id: &str) -> serde_json::Value {
    let mut payload = serde_json::to_value(doc).unwrap_or_else(|_| serde_json::json!({}));
    payload["id"] = serde_json::Value::String(id.to_string());
    payload
}

/// Task descriptor as an event payload, with the resolved id filled in.
fn task_payload(doc: &TaskDoc, id: &str) -> serde_json::Value {
    let mut payload = serde_json::to_value(doc).unwrap_or_else(|_| serde_json::json!({}));
    payload["id"] = serde_json::Value::String(id.to_string());
    payload
}

/// Which conflict rule, if any, applies to a changed spec file.
fn spec_conflict(
    path: &Path,
    cursor: &ReconcileCursor,
    fingerprint: &str,
    version: i64,
    mtime: DateTime<Utc>,
) -> Option<(ConflictReason, serde_json::Value)> {
    let file = path.display().to_string();

    if version > 0 && cursor.version > 0 && version < cursor.version {
        return Some((
            ConflictReason::SpecVersionRegression,
            serde_json::json!({
                "file": file,
                "file_version": version,
                "cursor_version": cursor.version,
            }),
        ));
    }
    if version > 0 && cursor.version > 0 && version == cursor.version
        && fingerprint != cursor.fingerprint
    {
        return Some((
            ConflictReason::SpecVersionMismatch,
            serde_json::json!({
                "file": file,
                "version": version,
                "file_fingerprint": fingerprint,
                "cursor_fingerprint": cursor.fingerprint,
            }),
        ));
    }
    if version == 0 && cursor.version == 0 && mtime < cursor.updated_at
        && fingerprint != cursor.fingerprint
    {
        return Some((
            ConflictReason::SpecMtimeRegression,
            serde_json::json!({
                "file": file,
                "file_mtime": mtime.to_rfc3339(),
                "cursor_mtime": cursor.updated_at.to_rfc3339(),
            }),
        ));
    }
    None
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
