// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconcile cursors and conflict log.
//!
//! A cursor is the per-entity bookkeeping row the reconciler compares file
//! state against: the fingerprint of the last accepted bytes, the last
//! observed status and version, and the file mtime. Conflicts are an
//! append-only audit trail and are never deduplicated.

use crate::db::StorageError;
use crate::events::EventStore;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use spindle_contract::EntityType;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Why a reconcile pass refused a file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Spec file version went backwards while versioning is in use
    SpecVersionRegression,
    /// Spec version unchanged but file content differs from the cursor
    SpecVersionMismatch,
    /// Unversioned spec file went backwards in mtime with changed content
    SpecMtimeRegression,
    /// Task left a terminal status
    TaskStatusRegression,
}

impl ConflictReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictReason::SpecVersionRegression => "spec_version_regression",
            ConflictReason::SpecVersionMismatch => "spec_version_mismatch",
            ConflictReason::SpecMtimeRegression => "spec_mtime_regression",
            ConflictReason::TaskStatusRegression => "task_status_regression",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "spec_version_regression" => Some(ConflictReason::SpecVersionRegression),
            "spec_version_mismatch" => Some(ConflictReason::SpecVersionMismatch),
            "spec_mtime_regression" => Some(ConflictReason::SpecMtimeRegression),
            "task_status_regression" => Some(ConflictReason::TaskStatusRegression),
            _ => None,
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of reconcile bookkeeping, keyed by
/// `(project_path, entity_type, entity_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileCursor {
    pub project_path: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    /// Hex SHA-256 of the raw file bytes last accepted
    pub fingerprint: String,
    /// Last observed status string, lowercased
    pub status: String,
    /// Last observed version, 0 when the file carries none
    pub version: i64,
    /// File mtime at the last accepted reconcile
    pub updated_at: DateTime<Utc>,
}

/// Append-only record of a detected disagreement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileConflict {
    /// Assigned by the store at log time, 0 before
    pub id: i64,
    pub project_path: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub reason: ConflictReason,
    /// Evidence bag: file path, fingerprints, versions, statuses, mtimes
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ReconcileConflict {
    pub fn new(
        project_path: impl Into<String>,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        reason: ConflictReason,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: 0,
            project_path: project_path.into(),
            entity_type,
            entity_id: entity_id.into(),
            reason,
            details,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Cursor and conflict storage, co-resident with the event store.
#[derive(Clone)]
pub struct CursorStore {
    conn: Arc<Mutex<Connection>>,
}

impl CursorStore {
    /// Build a cursor store sharing the event store's connection.
    pub fn new(store: &EventStore) -> Self {
        Self {
            conn: store.connection(),
        }
    }

    /// Fetch the cursor for one entity, or `None` on first contact.
    pub fn get(
        &self,
        project_path: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Option<ReconcileCursor>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT project_path, entity_type, entity_id, fingerprint, status, version, updated_at
             FROM reconcile_cursors
             WHERE project_path = ?1 AND entity_type = ?2 AND entity_id = ?3",
        )?;
        let mut rows = stmt.query_map(
            params![project_path, entity_type.as_str(), entity_id],
            row_to_cursor,
        )?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Insert or update a cursor on its composite key.
    ///
    /// An epoch-zero `updated_at` is stamped with the current time.
    pub fn upsert(&self, cursor: &ReconcileCursor) -> Result<(), StorageError> {
        let updated_at = if cursor.updated_at.timestamp_millis() == 0 {
            Utc::now()
        } else {
            cursor.updated_at
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO reconcile_cursors (project_path, entity_type, entity_id, fingerprint, status, version, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (project_path, entity_type, entity_id) DO UPDATE SET
                 fingerprint = excluded.fingerprint,
                 status = excluded.status,
                 version = excluded.version,
                 updated_at = excluded.updated_at",
            params![
                cursor.project_path,
                cursor.entity_type.as_str(),
                cursor.entity_id,
                cursor.fingerprint,
                cursor.status,
                cursor.version,
                updated_at.timestamp_micros(),
            ],
        )?;
        debug!(
            entity_type = %cursor.entity_type,
            entity_id = %cursor.entity_id,
            fingerprint = %&cursor.fingerprint[..cursor.fingerprint.len().min(12)],
            "upserted cursor"
        );
        Ok(())
    }

    /// Append a conflict row; conflicts are never deduplicated.
    pub fn log_conflict(&self, conflict: &mut ReconcileConflict) -> Result<(), StorageError> {
        if conflict.created_at.timestamp_millis() == 0 {
            conflict.created_at = Utc::now();
        }
        let details = serde_json::to_string(&conflict.details)?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO reconcile_conflicts (project_path, entity_type, entity_id, reason, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                conflict.project_path,
                conflict.entity_type.as_str(),
                conflict.entity_id,
                conflict.reason.as_str(),
                details,
                conflict.created_at.timestamp_micros(),
            ],
        )?;
        conflict.id = conn.last_insert_rowid();
        Ok(())
    }

    /// List conflicts for a project, newest first.
    pub fn list_conflicts(
        &self,
        project_path: &str,
        limit: usize,
    ) -> Result<Vec<ReconcileConflict>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, project_path, entity_type, entity_id, reason, details, created_at
             FROM reconcile_conflicts
             WHERE project_path = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![project_path, limit as i64], row_to_conflict)?;
        let mut conflicts = Vec::new();
        for row in rows {
            conflicts.push(row?);
        }
        Ok(conflicts)
    }
}

fn row_to_cursor(row: &Row<'_>) -> rusqlite::Result<ReconcileCursor> {
    let entity_type: String = row.get(1)?;
    let updated_at_micros: i64 = row.get(6)?;
    Ok(ReconcileCursor {
        project_path: row.get(0)?,
        entity_type: EntityType::parse(&entity_type)
            .ok_or_else(|| corrupt_tag(1, &entity_type))?,
        entity_id: row.get(2)?,
        fingerprint: row.get(3)?,
        status: row.get(4)?,
        version: row.get(5)?,
        updated_at: DateTime::from_timestamp_micros(updated_at_micros)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

fn row_to_conflict(row: &Row<'_>) -> rusqlite::Result<ReconcileConflict> {
    let entity_type: String = row.get(2)?;
    let reason: String = row.get(4)?;
    let details: String = row.get(5)?;
    let created_at_micros: i64 = row.get(6)?;
    Ok(ReconcileConflict {
        id: row.get(0)?,
        project_path: row.get(1)?,
        entity_type: EntityType::parse(&entity_type)
            .ok_or_else(|| corrupt_tag(2, &entity_type))?,
        entity_id: row.get(3)?,
        reason: ConflictReason::parse(&reason).ok_or_else(|| corrupt_tag(4, &reason))?,
        details: serde_json::from_str(&details)
            .map_err(|e| corrupt_tag(5, &format!("invalid details JSON: {e}")))?,
        created_at: DateTime::from_timestamp_micros(created_at_micros)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

fn corrupt_tag(column: usize, message: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(StorageError::Corrupt {
            message: message.to_string(),
        }),
    )
}

#[cfg(test)]
#[path = "cursors_tests.rs"]
mod tests;
