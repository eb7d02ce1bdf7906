//! Outbox the reducers' effects write notifications into.

use super::Notification;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Accepts notifications for later delivery.
///
/// `enqueue` is infallible from the caller's point of view: by the time it runs the
/// transition is committed, so a full or closed outbox is logged and dropped.
pub trait NotificationOutbox: Send + Sync {
    /// Queue a notification
    fn enqueue(&self, notification: Notification);
}

/// Outbox backed by an unbounded tokio channel, drained by a `NotificationWorker`.
#[derive(Clone, Debug)]
pub struct ChannelOutbox {
    sender: mpsc::UnboundedSender<Notification>,
}

/// Creates a connected outbox and receiver.
#[must_use]
pub fn channel() -> (ChannelOutbox, mpsc::UnboundedReceiver<Notification>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelOutbox { sender }, receiver)
}

impl NotificationOutbox for ChannelOutbox {
    fn enqueue(&self, notification: Notification) {
        let kind = notification.kind;
        let reference = notification.context.transaction_reference.clone();
        if self.sender.send(notification).is_err() {
            tracing::warn!(
                kind = kind.as_str(),
                transaction = %reference,
                "Notification worker is gone; dropping notification"
            );
            metrics::counter!("momenta_notifications_total", "outcome" => "dropped").increment(1);
        } else {
            tracing::debug!(kind = kind.as_str(), transaction = %reference, "Notification queued");
        }
    }
}

/// Outbox that keeps everything in memory, for tests.
#[derive(Debug, Default)]
pub struct InMemoryOutbox {
    queued: Mutex<Vec<Notification>>,
}

impl InMemoryOutbox {
    /// Creates an empty outbox
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything queued so far
    #[must_use]
    pub fn queued(&self) -> Vec<Notification> {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns everything queued so far
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.queued.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl NotificationOutbox for InMemoryOutbox {
    fn enqueue(&self, notification: Notification) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
