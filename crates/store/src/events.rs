// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only event store.
//!
//! `append` is the only mutator; rows are never updated or deleted. All
//! reads are ordered by `id` ascending, and a newly assigned id is always
//! greater than any id observed before the append returned.

use crate::db::{open_database, StorageError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, Row};
use spindle_contract::{EntityType, EventFilter, EventRecord, EventType, SourceTool};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Handle to the append-only event log.
///
/// Cheap to clone; all clones share one connection. The WAL journal
/// serializes writers internally.
#[derive(Clone, Debug)]
pub struct EventStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl EventStore {
    /// Open (or create) the event database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_owned();
        let conn = open_database(&path)?;
        Ok(Self { conn, path })
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shared connection, for the co-resident cursor store.
    pub(crate) fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// Append an event, assigning its `id` and (when unstamped) `created_at`.
    pub fn append(&self, event: &mut EventRecord) -> Result<(), StorageError> {
        if event.is_unstamped() {
            event.created_at = Utc::now();
        }
        let payload = serde_json::to_string(&event.payload)?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO events (event_type, entity_type, entity_id, source_tool, payload, project_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.event_type.as_str(),
                event.entity_type.as_str(),
                event.entity_id,
                event.source_tool.as_str(),
                payload,
                event.project_path,
                event.created_at.timestamp_micros(),
            ],
        )?;
        event.id = conn.last_insert_rowid();
        debug!(id = event.id, event_type = %event.event_type, entity_id = %event.entity_id, "appended event");
        Ok(())
    }

    /// Query events matching `filter`, ordered by `id` ascending.
    pub fn query(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, StorageError> {
        let (where_sql, params) = build_where(filter, None);
        let mut sql = format!("SELECT id, event_type, entity_type, entity_id, source_tool, payload, project_path, created_at FROM events{where_sql} ORDER BY id ASC");
        match (filter.limit, filter.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // SQLite requires a LIMIT clause to apply an OFFSET
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), row_to_event)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Fetch a single event by id.
    pub fn get(&self, id: i64) -> Result<EventRecord, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, event_type, entity_type, entity_id, source_tool, payload, project_path, created_at
             FROM events WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], row_to_event)?;
        match rows.next() {
            Some(row) => Ok(row?),
            None => Err(StorageError::NotFound { id }),
        }
    }

    /// Highest assigned event id, or 0 for an empty log.
    pub fn last_id(&self) -> Result<i64, StorageError> {
        let conn = self.conn.lock();
        let id = conn.query_row("SELECT COALESCE(MAX(id), 0) FROM events", [], |row| {
            row.get(0)
        })?;
        Ok(id)
    }

    /// Total number of events in the log.
    pub fn count(&self) -> Result<i64, StorageError> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Stream events with `id > since_id` matching `filter` through `handler`
    /// in id order. The first handler error aborts the replay.
    ///
    /// The matching rows are snapshotted under the connection lock before
    /// any handler runs, so a replay never observes a torn write.
    pub fn replay<F>(
        &self,
        since_id: i64,
        filter: &EventFilter,
        mut handler: F,
    ) -> Result<(), StorageError>
    where
        F: FnMut(&EventRecord) -> Result<(), StorageError>,
    {
        let events = {
            let (where_sql, params) = build_where(filter, Some(since_id));
            let sql = format!("SELECT id, event_type, entity_type, entity_id, source_tool, payload, project_path, created_at FROM events{where_sql} ORDER BY id ASC");
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(params), row_to_event)?;
            let mut events = Vec::new();
            for row in rows {
                events.push(row?);
            }
            events
        };

        for event in &events {
            handler(event)?;
        }
        Ok(())
    }

    /// Checkpoint the WAL and release the handle.
    ///
    /// Dropping the last clone has the same effect; this form surfaces
    /// checkpoint errors.
    pub fn close(self) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}

/// Build the WHERE clause and positional params for `filter`.
///
/// `since_id` adds the replay lower bound. `limit`/`offset` are handled by
/// the caller because SQLite wants them after ORDER BY.
fn build_where(filter: &EventFilter, since_id: Option<i64>) -> (String, Vec<SqlValue>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<SqlValue> = Vec::new();

    if let Some(since_id) = since_id {
        clauses.push("id > ?".to_string());
        params.push(SqlValue::Integer(since_id));
    }
    if !filter.event_types.is_empty() {
        clauses.push(in_clause("event_type", filter.event_types.len()));
        params.extend(
            filter
                .event_types
                .iter()
                .map(|t| SqlValue::Text(t.as_str().to_string())),
        );
    }
    if !filter.entity_types.is_empty() {
        clauses.push(in_clause("entity_type", filter.entity_types.len()));
        params.extend(
            filter
                .entity_types
                .iter()
                .map(|t| SqlValue::Text(t.as_str().to_string())),
        );
    }
    if !filter.entity_ids.is_empty() {
        clauses.push(in_clause("entity_id", filter.entity_ids.len()));
        params.extend(
            filter
                .entity_ids
                .iter()
                .map(|id| SqlValue::Text(id.clone())),
        );
    }
    if !filter.source_tools.is_empty() {
        clauses.push(in_clause("source_tool", filter.source_tools.len()));
        params.extend(
            filter
                .source_tools
                .iter()
                .map(|t| SqlValue::Text(t.as_str().to_string())),
        );
    }
    if let Some(project) = &filter.project_path {
        clauses.push("project_path = ?".to_string());
        params.push(SqlValue::Text(project.clone()));
    }
    if let Some(since) = filter.since {
        clauses.push("created_at >= ?".to_string());
        params.push(SqlValue::Integer(since.timestamp_micros()));
    }
    if let Some(until) = filter.until {
        clauses.push("created_at < ?".to_string());
        params.push(SqlValue::Integer(until.timestamp_micros()));
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

fn in_clause(column: &str, count: usize) -> String {
    let marks = vec!["?"; count].join(", ");
    format!("{column} IN ({marks})")
}

/// Map a row to an [`EventRecord`], failing on unknown persisted tags.
fn row_to_event(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    let event_type: String = row.get(1)?;
    let entity_type: String = row.get(2)?;
    let source_tool: String = row.get(4)?;
    let payload: String = row.get(5)?;
    let created_at_micros: i64 = row.get(7)?;

    Ok(EventRecord {
        id: row.get(0)?,
        event_type: EventType::parse(&event_type).ok_or_else(|| corrupt(1, &event_type))?,
        entity_type: EntityType::parse(&entity_type).ok_or_else(|| corrupt(2, &entity_type))?,
        entity_id: row.get(3)?,
        source_tool: SourceTool::parse(&source_tool).ok_or_else(|| corrupt(4, &source_tool))?,
        payload: serde_json::from_str(&payload)
            .map_err(|e| corrupt(5, &format!("invalid payload JSON: {e}")))?,
        project_path: row.get(6)?,
        created_at: DateTime::from_timestamp_micros(created_at_micros)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

fn corrupt(column: usize, message: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(StorageError::Corrupt {
            message: message.to_string(),
        }),
    )
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
