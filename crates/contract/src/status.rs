// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed status sets shared by all workbench tools.
//!
//! Every tag here is persisted verbatim in event payloads and cursor rows,
//! so the string forms are part of the on-disk compatibility contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status for workflow entities (initiatives, epics, stories, outcomes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    Open,
    InProgress,
    Done,
    Closed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Done => "done",
            Status::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Status::Draft),
            "open" => Some(Status::Open),
            "in_progress" => Some(Status::InProgress),
            "done" => Some(Status::Done),
            "closed" => Some(Status::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "blocked" => Some(TaskStatus::Blocked),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Whether this status is terminal (no further transitions expected)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of an agent run while it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Working,
    Waiting,
    Blocked,
    Done,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Working => "working",
            RunState::Waiting => "waiting",
            RunState::Blocked => "blocked",
            RunState::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "working" => Some(RunState::Working),
            "waiting" => Some(RunState::Waiting),
            "blocked" => Some(RunState::Blocked),
            "done" => Some(RunState::Done),
            _ => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// T-shirt complexity estimate carried on tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Xs,
    S,
    M,
    L,
    Xl,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Xs => "xs",
            Complexity::S => "s",
            Complexity::M => "m",
            Complexity::L => "l",
            Complexity::Xl => "xl",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "xs" => Some(Complexity::Xs),
            "s" => Some(Complexity::S),
            "m" => Some(Complexity::M),
            "l" => Some(Complexity::L),
            "xl" => Some(Complexity::Xl),
            _ => None,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical tag for the tool that originated an event.
///
/// gurgeh authors PRDs and specs, coldwine owns tasks and execution,
/// pollard is the research tool, bigend is the aggregator shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTool {
    Gurgeh,
    Coldwine,
    Pollard,
    Bigend,
}

impl SourceTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTool::Gurgeh => "gurgeh",
            SourceTool::Coldwine => "coldwine",
            SourceTool::Pollard => "pollard",
            SourceTool::Bigend => "bigend",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gurgeh" => Some(SourceTool::Gurgeh),
            "coldwine" => Some(SourceTool::Coldwine),
            "pollard" => Some(SourceTool::Pollard),
            "bigend" => Some(SourceTool::Bigend),
            _ => None,
        }
    }
}

impl fmt::Display for SourceTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
