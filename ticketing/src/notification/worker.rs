//! Background task that drains the notification outbox.

use super::{EmailTemplates, Notification, Notifier};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Delivery counters returned when the worker stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Handed to the notifier successfully
    pub delivered: u64,
    /// Notifier returned an error
    pub failed: u64,
    /// No recipient address
    pub skipped: u64,
}

/// What happened to one notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Sent
    Delivered,
    /// Transport failed; logged and dropped
    Failed,
    /// Nothing to send to
    Skipped,
}

impl Delivery {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Renders and sends queued notifications until every outbox sender is dropped.
pub struct NotificationWorker<N> {
    receiver: mpsc::UnboundedReceiver<Notification>,
    notifier: N,
    templates: EmailTemplates,
}

impl<N: Notifier> NotificationWorker<N> {
    /// Creates a worker over the receiving half of [`channel`](super::channel).
    pub const fn new(
        receiver: mpsc::UnboundedReceiver<Notification>,
        notifier: N,
        templates: EmailTemplates,
    ) -> Self {
        Self {
            receiver,
            notifier,
            templates,
        }
    }

    /// Runs until the channel closes.
    pub async fn run(mut self) -> WorkerStats {
        let mut stats = WorkerStats::default();
        while let Some(notification) = self.receiver.recv().await {
            match self.deliver(&notification).await {
                Delivery::Delivered => stats.delivered += 1,
                Delivery::Failed => stats.failed += 1,
                Delivery::Skipped => stats.skipped += 1,
            }
        }
        debug!(?stats, "Notification worker stopped");
        stats
    }

    /// Renders and sends a single notification. Failures are never retried.
    pub async fn deliver(&self, notification: &Notification) -> Delivery {
        let kind = notification.kind.as_str();
        let reference = &notification.context.transaction_reference;

        let outcome = match self.templates.render(notification) {
            None => {
                debug!(kind, transaction = %reference, "No recipient address; skipping email");
                Delivery::Skipped
            },
            Some(email) => match self.notifier.send(&email).await {
                Ok(()) => {
                    debug!(kind, transaction = %reference, to = %email.to, "Notification sent");
                    Delivery::Delivered
                },
                Err(error) => {
                    warn!(
                        kind,
                        transaction = %reference,
                        to = %email.to,
                        error = %error,
                        "Failed to send notification"
                    );
                    Delivery::Failed
                },
            },
        };

        metrics::counter!("momenta_notifications_total", "outcome" => outcome.as_str())
            .increment(1);
        outcome
    }
}
