//! Notification collaborator.
//!
//! Events are published after the corresponding state change commits.
//! Delivery is best-effort: a failing sink is logged and never turns a
//! committed trade or verification into an error.

use serde::Serialize;
use thiserror::Error;

use tradepost_store::TradeEntry;
use tradepost_types::{Handle, Timestamp};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExchangeEvent {
    TradeCompleted {
        entry: TradeEntry,
    },
    IdentityVerified {
        handle: Handle,
        verified_by: String,
        verified_at: Timestamp,
    },
}

impl ExchangeEvent {
    /// Subscription topic this event is delivered on.
    pub fn topic(&self) -> &'static str {
        match self {
            ExchangeEvent::TradeCompleted { .. } => "trades",
            ExchangeEvent::IdentityVerified { .. } => "verification",
        }
    }

    /// Handles the event concerns, for subscriber filtering.
    pub fn handles(&self) -> Vec<&Handle> {
        match self {
            ExchangeEvent::TradeCompleted { entry } => {
                vec![&entry.participant_a, &entry.participant_b]
            }
            ExchangeEvent::IdentityVerified { handle, .. } => vec![handle],
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel closed")]
    Closed,

    #[error("notification rejected: {0}")]
    Rejected(String),
}

pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: &ExchangeEvent) -> Result<(), NotifyError>;
}

/// Publish and log a failure instead of returning it.
pub fn publish_best_effort(sink: &dyn NotificationSink, event: &ExchangeEvent) {
    if let Err(e) = sink.publish(event) {
        tracing::warn!(topic = event.topic(), error = %e, "failed to publish event");
    }
}

/// A sink that only records events in the log. Used when no push channel
/// is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, event: &ExchangeEvent) -> Result<(), NotifyError> {
        tracing::debug!(topic = event.topic(), ?event, "event");
        Ok(())
    }
}
