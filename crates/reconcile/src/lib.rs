// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spindle-reconcile: file-to-event reconciliation.
//!
//! Tools own their YAML files on disk; this crate observes them and turns
//! real changes into events on the spine without ever emitting duplicates
//! or regressing recorded state. Disagreements between file state and
//! cursor state become append-only conflict rows a human can audit.

mod engine;
mod files;

pub use engine::{ReconcileError, ReconcileSummary, Reconciler};
pub use files::{SpecDoc, TaskDoc};
