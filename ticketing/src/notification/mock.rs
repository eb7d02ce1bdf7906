//! Recording notifier for tests.

use super::{NotificationError, Notifier, OutboundEmail};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

/// Records every email it is asked to send; can be told to fail.
#[derive(Clone, Debug, Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
    /// When `false`, every send fails with a transport error.
    pub should_succeed: bool,
}

impl MockNotifier {
    /// A notifier that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self {
            sent: Arc::default(),
            should_succeed: true,
        }
    }

    /// A notifier whose transport is down
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            should_succeed: false,
        }
    }

    /// Emails accepted so far
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for MockNotifier {
    fn send(
        &self,
        email: &OutboundEmail,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send {
        let result = if self.should_succeed {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(email.clone());
            Ok(())
        } else {
            Err(NotificationError::Transport("connection refused".to_string()))
        };
        async move { result }
    }
}
