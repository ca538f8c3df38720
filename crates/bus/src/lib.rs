// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spindle-bus: typed writer/reader APIs over the event spine.
//!
//! A writer appends typed events and fans them out to in-process
//! subscribers; a reader queries, watches, and folds the log into current
//! entity state. The store remains the only durable sink — subscriber
//! channels are best-effort and may drop under backpressure.

mod projector;
mod reader;
mod subscribe;
mod writer;

pub use projector::{ProjectState, RunPhase, RunView, TaskView, WorkItemView};
pub use reader::EventReader;
pub use subscribe::{SubscriberRegistry, Subscription, SubscriptionId};
pub use writer::EventWriter;
