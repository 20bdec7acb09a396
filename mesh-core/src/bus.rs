//! # Notification Bus
//!
//! The append-only record of everything the user should hear about.
//!
//! ## Purpose
//! Store and comment operations never talk to the dashboard directly. They push a
//! [`Notification`] here; the log keeps it forever (for late readers) and the
//! broadcast channel hands it to live subscribers such as the WebSocket feed.

use crate::model::{Notification, Severity};
use log::debug;
use tokio::sync::broadcast;

pub const DEFAULT_CAPACITY: usize = 100;

/// Upper bound on the broadcast buffer whatever hint is given.
pub const MAX_CAPACITY: usize = 4096;

/// Append-only notification log plus live fan-out.
///
/// The capacity is a hint: it sizes the broadcast buffer, clamped to
/// `1..=MAX_CAPACITY`. The log itself grows as needed and never evicts.
#[derive(Debug)]
pub struct NotificationBus {
    log: Vec<Notification>,
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// See [`tokio::sync::broadcast::channel`] for the buffer semantics.
    pub fn with_capacity(capacity_hint: usize) -> Self {
        // broadcast::channel panics on zero and allocates the full buffer up front
        let (sender, _) = broadcast::channel(capacity_hint.clamp(1, MAX_CAPACITY));
        Self {
            log: Vec::with_capacity(capacity_hint.min(DEFAULT_CAPACITY)),
            sender,
        }
    }

    /// Appends a notification and fans it out to subscribers.
    pub fn publish(&mut self, notification: Notification) -> &Notification {
        debug!(
            "Bus: [{:?}] {} - {}",
            notification.severity(),
            notification.title(),
            notification.message()
        );
        // No subscribers is fine (e.g. tests, CLI-less runs)
        let _ = self.sender.send(notification.clone());
        self.log.push(notification);
        &self.log[self.log.len() - 1]
    }

    pub fn info(&mut self, title: &str, message: impl Into<String>) -> &Notification {
        self.publish(Notification::new(Severity::Info, title, message))
    }

    pub fn success(&mut self, title: &str, message: impl Into<String>) -> &Notification {
        self.publish(Notification::new(Severity::Success, title, message))
    }

    pub fn error(&mut self, title: &str, message: impl Into<String>) -> &Notification {
        self.publish(Notification::new(Severity::Error, title, message))
    }

    /// All notifications, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.log
    }

    /// Notifications appended at or after `index`.
    pub fn since(&self, index: usize) -> &[Notification] {
        self.log.get(index..).unwrap_or(&[])
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.log.last()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// See [`tokio::sync::broadcast::Sender::subscribe`] for details.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}
