// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spindle-contract: canonical entity shapes and event vocabulary
//!
//! The contract crate is the shared language of the workbench tools: entity
//! structs, their closed status sets, the event record and filter that the
//! store persists, field validators, and the schema version handshake. It
//! performs no I/O.

pub mod entity;
pub mod event;
pub mod limits;
pub mod schema;
pub mod status;
pub mod validate;

pub use entity::{Epic, Initiative, InsightLink, Outcome, Run, Story, Task};
pub use event::{EntityType, EventFilter, EventRecord, EventType};
pub use schema::{is_compatible, SCHEMA_VERSION};
pub use status::{Complexity, RunState, SourceTool, Status, TaskStatus};
pub use validate::{
    validate_epic, validate_initiative, validate_insight_link, validate_outcome, validate_run,
    validate_story, validate_task, CrossToolValidator, ValidationIssue, ValidationResult,
};
