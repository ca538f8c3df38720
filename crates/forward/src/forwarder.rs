// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Envelope construction and the outbound send seam.

use async_trait::async_trait;
use chrono::SecondsFormat;
use spindle_contract::{EventRecord, EventType};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Errors from an outbound send.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("send failed: {0}")]
    Send(String),
    #[error("send cancelled")]
    Cancelled,
}

/// Relative urgency of a forwarded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Normal,
    High,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Normal => "normal",
            Importance::High => "high",
        }
    }
}

/// One message handed to a [`MessageSender`].
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Project tag for the receiving side
    pub project: String,
    /// Sender identity
    pub from: String,
    /// Explicit recipients; empty means the sink's default routing
    pub recipients: Vec<String>,
    pub importance: Importance,
    /// The event envelope (see [`EventForwarder::forward`])
    pub envelope: serde_json::Value,
}

/// Receipt returned by a sink after a successful send.
#[derive(Debug, Clone, Default)]
pub struct SendReceipt {
    /// Sink-assigned message id, when the sink provides one
    pub message_id: Option<String>,
}

/// Outbound transport seam.
///
/// Implementations wrap whatever external messaging system the deployment
/// uses; the forwarder only needs this one method.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, message: OutboundMessage) -> Result<SendReceipt, ForwardError>;
}

/// Mirrors events to a [`MessageSender`].
pub struct EventForwarder<S> {
    sender: S,
    project: String,
    from: String,
    recipients: Vec<String>,
}

impl<S: MessageSender> EventForwarder<S> {
    pub fn new(sender: S, project: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            sender,
            project: project.into(),
            from: from.into(),
            recipients: Vec::new(),
        }
    }

    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    /// Wrap one event in its envelope and send it.
    ///
    /// The envelope carries `event_id`, `event_type`, `entity_type`,
    /// `entity_id`, `source_tool`, `payload`, `project_path`, and an
    /// RFC 3339 UTC `created_at`. Event types whose tag mentions a
    /// failure (`failed`, `blocked`, `error`) are marked high importance.
    pub async fn forward(&self, event: &EventRecord) -> Result<SendReceipt, ForwardError> {
        let message = OutboundMessage {
            project: self.project.clone(),
            from: self.from.clone(),
            recipients: self.recipients.clone(),
            importance: importance_for(event.event_type),
            envelope: envelope_for(event),
        };
        debug!(event_id = event.id, importance = message.importance.as_str(), "forwarding");
        self.sender.send_message(message).await
    }

    /// Drain a subscription channel into the sink until `cancel` fires or
    /// the channel closes. Send failures are logged and skipped — the
    /// store remains authoritative.
    pub async fn run(&self, mut rx: mpsc::Receiver<EventRecord>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    if let Err(e) = self.forward(&event).await {
                        warn!(event_id = event.id, error = %e, "forward failed, skipping event");
                    }
                }
            }
        }
    }
}

/// High importance for failure-ish event tags, normal otherwise.
fn importance_for(event_type: EventType) -> Importance {
    let tag = event_type.as_str();
    if tag.contains("failed") || tag.contains("blocked") || tag.contains("error") {
        Importance::High
    } else {
        Importance::Normal
    }
}

/// Build the wire envelope for one event.
///
/// A payload that is itself a JSON-encoded string is unwrapped; anything
/// unparseable rides along as the opaque string.
fn envelope_for(event: &EventRecord) -> serde_json::Value {
    let payload = match &event.payload {
        serde_json::Value::String(raw) => {
            serde_json::from_str(raw).unwrap_or_else(|_| event.payload.clone())
        }
        other => other.clone(),
    };

    serde_json::json!({
        "event_id": event.id,
        "event_type": event.event_type.as_str(),
        "entity_type": event.entity_type.as_str(),
        "entity_id": event.entity_id,
        "source_tool": event.source_tool.as_str(),
        "payload": payload,
        "project_path": event.project_path,
        "created_at": event.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
    })
}

#[cfg(test)]
#[path = "forwarder_tests.rs"]
mod tests;
