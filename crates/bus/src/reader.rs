// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read side of the bus: queries, subscriptions, and the polling watch.

use crate::projector::{self, ProjectState};
use crate::subscribe::{SubscriberRegistry, Subscription, SubscriptionId};
use chrono::{DateTime, Utc};
use spindle_contract::{EventFilter, EventRecord};
use spindle_store::{EventStore, StorageError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Bound for watch output channels.
const WATCH_CAPACITY: usize = 256;

/// Reader half of the bus.
///
/// Subscriptions only observe events when the registry is shared with the
/// emitting [`crate::EventWriter`]; `watch` polls the store instead and
/// needs no shared state, which makes it the right tool for out-of-process
/// readers.
#[derive(Clone)]
pub struct EventReader {
    store: EventStore,
    subscribers: SubscriberRegistry,
}

impl EventReader {
    pub fn new(store: EventStore) -> Self {
        Self {
            store,
            subscribers: SubscriberRegistry::new(),
        }
    }

    /// Share a subscriber registry with a writer.
    pub fn with_subscribers(mut self, subscribers: SubscriberRegistry) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Query events matching `filter`, ordered by id.
    pub fn query(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, StorageError> {
        self.store.query(filter)
    }

    /// Fetch one event by id.
    pub fn get(&self, id: i64) -> Result<EventRecord, StorageError> {
        self.store.get(id)
    }

    /// All events created at or after `since`, ordered by id.
    pub fn events_since(&self, since: DateTime<Utc>) -> Result<Vec<EventRecord>, StorageError> {
        self.store.query(&EventFilter {
            since: Some(since),
            ..Default::default()
        })
    }

    /// Register an in-process subscription on the shared registry.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.subscribers.subscribe(filter)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Poll the store every `interval` and forward new matching events in
    /// id order until `cancel` fires, then close the channel.
    ///
    /// The watch starts at the current log tail: only events appended
    /// after this call are delivered. Delivery is at-least-once with no
    /// freshness guarantee below `interval`.
    pub fn watch(
        &self,
        filter: EventFilter,
        interval: Duration,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<EventRecord> {
        let (tx, rx) = mpsc::channel(WATCH_CAPACITY);
        let store = self.store.clone();

        tokio::spawn(async move {
            let mut last_id = match store.last_id() {
                Ok(id) => id,
                Err(e) => {
                    warn!(error = %e, "watch failed to read log tail, starting at 0");
                    0
                }
            };

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                let mut batch = Vec::new();
                let poll = store.replay(last_id, &filter, |event| {
                    batch.push(event.clone());
                    Ok(())
                });
                if let Err(e) = poll {
                    warn!(error = %e, "watch poll failed, retrying next interval");
                    continue;
                }

                for event in batch {
                    last_id = last_id.max(event.id);
                    if tx.send(event).await.is_err() {
                        // Receiver dropped; stop polling
                        return;
                    }
                }
            }
            debug!("watch cancelled");
        });

        rx
    }

    /// Replay all events matching `filter` and fold them into current
    /// entity state.
    pub fn build_state(&self, filter: &EventFilter) -> Result<ProjectState, StorageError> {
        projector::build_state(&self.store, filter)
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
