// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection setup, pragmas, migrations, and the storage error taxonomy.

use parking_lot::Mutex;
use rusqlite::Connection;
use spindle_contract::schema;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Busy timeout for contending readers on the shared database file.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Errors from the event and cursor stores.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event {id} not found")]
    NotFound { id: i64 },
    #[error("corrupt row: {message}")]
    Corrupt { message: String },
    #[error("database schema version {found} is incompatible with {}", schema::SCHEMA_VERSION)]
    IncompatibleSchema { found: String },
    #[error("replay handler aborted: {0}")]
    Handler(String),
}

/// Default database location: `$SPINDLE_EVENTS_DB` > `$HOME/.spindle/events.db`
/// > `./.spindle/events.db` when no home can be resolved.
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("SPINDLE_EVENTS_DB") {
        return PathBuf::from(path);
    }
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home).join(".spindle/events.db"),
        _ => PathBuf::from(".spindle/events.db"),
    }
}

/// Open the database file, apply pragmas, and run migrations.
///
/// The parent directory is created if missing. Refuses to open a database
/// stamped with an incompatible schema major version.
pub(crate) fn open_database(path: &Path) -> Result<Arc<Mutex<Connection>>, StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode = wal;")?;
    conn.execute_batch("PRAGMA synchronous = normal;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    migrate(&conn)?;
    check_schema_version(&conn)?;

    debug!(path = %path.display(), "opened event database");
    Ok(Arc::new(Mutex::new(conn)))
}

/// Idempotent schema migration. Every statement is a no-op when the
/// object already exists, so re-opening an existing database is safe.
fn migrate(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            source_tool TEXT NOT NULL,
            payload TEXT NOT NULL,
            project_path TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_events_event_type ON events(event_type);
        CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);
        CREATE INDEX IF NOT EXISTS idx_events_source_tool ON events(source_tool);
        CREATE INDEX IF NOT EXISTS idx_events_created_at ON events(created_at);
        CREATE INDEX IF NOT EXISTS idx_events_project_path ON events(project_path);

        CREATE TABLE IF NOT EXISTS reconcile_cursors (
            project_path TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            status TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (project_path, entity_type, entity_id)
        );

        CREATE TABLE IF NOT EXISTS reconcile_conflicts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_path TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            reason TEXT NOT NULL,
            details TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    Ok(())
}

/// Stamp a fresh database with the current schema version, or verify an
/// existing stamp is within the same major version.
fn check_schema_version(conn: &Connection) -> Result<(), StorageError> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    match existing {
        Some(found) if !schema::is_compatible(&found) => {
            Err(StorageError::IncompatibleSchema { found })
        }
        Some(_) => Ok(()),
        None => {
            conn.execute(
                "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
                [schema::SCHEMA_VERSION],
            )?;
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
