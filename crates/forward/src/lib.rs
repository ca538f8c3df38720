// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spindle-forward: mirror locally appended events to an external sink.
//!
//! The forwarder is pure fan-out: it never reads back, never deduplicates,
//! and leaves ordering to its caller. It is designed to sit at the end of
//! a writer's subscriber chain — the store stays the only durable record.

mod forwarder;

pub use forwarder::{
    EventForwarder, ForwardError, Importance, MessageSender, OutboundMessage, SendReceipt,
};
