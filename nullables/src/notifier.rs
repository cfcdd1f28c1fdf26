//! Nullable notifier: record events without delivering them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tradepost_exchange::{ExchangeEvent, NotificationSink, NotifyError};

/// A notification sink that records events instead of pushing them.
pub struct NullNotifier {
    /// All events "published" so far.
    published: Mutex<Vec<ExchangeEvent>>,
    /// When set, every publish fails with `NotifyError::Closed`.
    failing: AtomicBool,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// A notifier whose channel is already closed.
    pub fn failing() -> Self {
        let n = Self::new();
        n.set_failing(true);
        n
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get all published events (for assertions).
    pub fn events(&self) -> Vec<ExchangeEvent> {
        self.published.lock().unwrap().clone()
    }

    /// Events published on one topic.
    pub fn events_on(&self, topic: &str) -> Vec<ExchangeEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.topic() == topic)
            .collect()
    }

    /// Clear all state.
    pub fn reset(&self) {
        self.published.lock().unwrap().clear();
        self.set_failing(false);
    }
}

impl Default for NullNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for NullNotifier {
    fn publish(&self, event: &ExchangeEvent) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Closed);
        }
        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }
}
