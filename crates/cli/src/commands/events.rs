// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event log queries.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Args, Subcommand};
use spindle_bus::EventReader;
use spindle_contract::{EntityType, EventFilter, EventRecord, EventType, SourceTool};
use spindle_store::EventStore;
use std::path::Path;

#[derive(Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Subcommand)]
pub enum EventsCommand {
    /// List events matching the given filters, oldest first
    Query {
        /// Event type filter (repeatable)
        #[arg(long = "type", value_name = "TYPE")]
        event_types: Vec<String>,
        /// Entity type filter (repeatable)
        #[arg(long = "entity", value_name = "TYPE")]
        entity_types: Vec<String>,
        /// Source tool filter (repeatable)
        #[arg(long = "source", value_name = "TOOL")]
        source_tools: Vec<String>,
        /// Only events at or after this RFC 3339 timestamp
        #[arg(long, value_name = "RFC3339")]
        since: Option<String>,
        /// Only events before this RFC 3339 timestamp
        #[arg(long, value_name = "RFC3339")]
        until: Option<String>,
        /// Maximum number of events to print
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
    /// List all events at or after a timestamp
    Since {
        /// RFC 3339 timestamp
        timestamp: String,
    },
}

pub fn handle(command: EventsCommand, db_path: &Path, project: Option<&Path>) -> Result<()> {
    let store = EventStore::open(db_path)
        .with_context(|| format!("cannot open events database at {}", db_path.display()))?;
    let reader = EventReader::new(store);

    let events = match command {
        EventsCommand::Query {
            event_types,
            entity_types,
            source_tools,
            since,
            until,
            limit,
        } => {
            let filter = EventFilter {
                event_types: parse_tags(&event_types, EventType::parse, "event type")?,
                entity_types: parse_tags(&entity_types, EntityType::parse, "entity type")?,
                source_tools: parse_tags(&source_tools, SourceTool::parse, "source tool")?,
                project_path: project.map(|p| p.to_string_lossy().into_owned()),
                since: since.as_deref().map(parse_timestamp).transpose()?,
                until: until.as_deref().map(parse_timestamp).transpose()?,
                limit,
                ..Default::default()
            };
            reader.query(&filter)?
        }
        EventsCommand::Since { timestamp } => {
            let filter = EventFilter {
                project_path: project.map(|p| p.to_string_lossy().into_owned()),
                since: Some(parse_timestamp(&timestamp)?),
                ..Default::default()
            };
            reader.query(&filter)?
        }
    };

    for event in &events {
        println!("{}", format_line(event));
    }
    Ok(())
}

/// One event per line: `TS  type  entity_type/entity_id  source`.
fn format_line(event: &EventRecord) -> String {
    format!(
        "{}  {}  {}/{}  {}",
        event.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        event.event_type,
        event.entity_type,
        event.entity_id,
        event.source_tool,
    )
}

fn parse_tags<T>(
    raw: &[String],
    parse: impl Fn(&str) -> Option<T>,
    what: &str,
) -> Result<Vec<T>> {
    let mut tags = Vec::with_capacity(raw.len());
    for tag in raw {
        match parse(tag) {
            Some(parsed) => tags.push(parsed),
            None => bail!("unknown {what} '{tag}'"),
        }
    }
    Ok(tags)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("invalid RFC 3339 timestamp '{raw}'"))
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
