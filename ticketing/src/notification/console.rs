//! Console notifier for development and the demo binary.

use super::{NotificationError, Notifier, OutboundEmail};
use std::future::Future;
use tracing::info;

/// Logs emails instead of sending them.
#[derive(Clone, Debug, Default)]
pub struct ConsoleNotifier {
    print_body: bool,
}

impl ConsoleNotifier {
    /// Logs headers only
    #[must_use]
    pub const fn new() -> Self {
        Self { print_body: false }
    }

    /// Also prints the rendered body to stdout
    #[must_use]
    pub const fn with_body(mut self) -> Self {
        self.print_body = true;
        self
    }
}

impl Notifier for ConsoleNotifier {
    fn send(
        &self,
        email: &OutboundEmail,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send {
        info!(to = %email.to, from = %email.from, subject = %email.subject, "📧 Email (console)");
        if self.print_body {
            println!("\n── {} ──\nTo: {}\n\n{}\n", email.subject, email.to, email.body);
        }
        async move { Ok(()) }
    }
}
