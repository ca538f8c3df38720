// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process subscriber registry.
//!
//! Each subscriber is a `(filter, bounded channel)` pair. Fan-out is
//! non-blocking: a full channel drops the event for that subscriber only,
//! never for the store. Closed receivers are pruned on the next fan-out.

use parking_lot::Mutex;
use spindle_contract::{EventFilter, EventRecord};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;
use uuid::Uuid;

/// Default bound for subscriber channels.
const DEFAULT_CAPACITY: usize = 256;

/// Opaque identifier of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live subscription: the id to unsubscribe with and the receiving end.
pub struct Subscription {
    pub id: SubscriptionId,
    pub rx: mpsc::Receiver<EventRecord>,
}

struct SubscriberEntry {
    filter: EventFilter,
    tx: mpsc::Sender<EventRecord>,
}

/// Shared set of in-process subscribers.
///
/// Clone freely; a writer and reader sharing one registry see the same
/// subscriptions. Delivery order within one subscriber is arrival order.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<HashMap<SubscriptionId, SubscriberEntry>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber with the default channel capacity.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.subscribe_with_capacity(filter, DEFAULT_CAPACITY)
    }

    /// Register a subscriber with an explicit channel capacity.
    pub fn subscribe_with_capacity(&self, filter: EventFilter, capacity: usize) -> Subscription {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = SubscriptionId(Uuid::new_v4());
        self.inner.lock().insert(id, SubscriberEntry { filter, tx });
        Subscription { id, rx }
    }

    /// Remove a subscription. Returns false when the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.lock().remove(&id).is_some()
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Deliver `event` to every matching subscriber without blocking.
    ///
    /// Full channels drop the event for that subscriber; closed channels
    /// are pruned.
    pub(crate) fn fan_out(&self, event: &EventRecord) {
        let mut registry = self.inner.lock();
        let mut closed = Vec::new();

        for (id, entry) in registry.iter() {
            if !entry.filter.matches(event) {
                continue;
            }
            match entry.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(
                        subscription = %id,
                        event_id = event.id,
                        "subscriber channel full, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            registry.remove(&id);
        }
    }
}

#[cfg(test)]
#[path = "subscribe_tests.rs"]
mod tests;
