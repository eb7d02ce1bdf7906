//! Plain-text email rendering for claim notifications.

use super::{Notification, NotificationContext, NotificationKind};
use crate::config::EmailConfig;
use serde::Serialize;
use std::fmt::Write as _;

/// A rendered message ready for a transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    /// Recipient address
    pub to: String,
    /// Sender, e.g. `Momenta <tickets@momenta.example>`
    pub from: String,
    /// Subject with the configured prefix
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Renders notifications using the configured branding and support contacts.
#[derive(Clone, Debug)]
pub struct EmailTemplates {
    config: EmailConfig,
}

const RULE: &str = "----------------------------------------";

impl EmailTemplates {
    /// Creates templates from email configuration
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Renders a notification. Returns `None` when there is no recipient.
    #[must_use]
    pub fn render(&self, notification: &Notification) -> Option<OutboundEmail> {
        let to = notification.recipient.as_deref()?.trim();
        if to.is_empty() {
            return None;
        }

        let ctx = &notification.context;
        let subject = format!(
            "{}{}",
            self.config.subject_prefix,
            Self::subject(notification.kind, ctx)
        );

        Some(OutboundEmail {
            to: to.to_string(),
            from: self.config.from_address.clone(),
            subject,
            body: self.body(notification.kind, ctx),
        })
    }

    fn subject(kind: NotificationKind, ctx: &NotificationContext) -> String {
        match kind {
            NotificationKind::ClaimSubmitted => {
                format!("Booking Received - Payment Pending - {}", ctx.event_title)
            },
            NotificationKind::ClaimApproved => format!("Payment Confirmed - {}", ctx.event_title),
            NotificationKind::ClaimRejected => format!("Payment Issue - {}", ctx.event_title),
            NotificationKind::ClaimRefunded => format!("Payment Refunded - {}", ctx.event_title),
        }
    }

    fn body(&self, kind: NotificationKind, ctx: &NotificationContext) -> String {
        let mut body = String::new();
        let _ = writeln!(body, "Dear {},", ctx.customer_name);
        let _ = writeln!(body);

        let (headline, status) = match kind {
            NotificationKind::ClaimSubmitted => (
                "We have received your booking. Your payment is pending confirmation by our team.",
                "PENDING CONFIRMATION",
            ),
            NotificationKind::ClaimApproved => (
                "Your payment has been confirmed. Your tickets are now valid.",
                "CONFIRMED",
            ),
            NotificationKind::ClaimRejected => (
                "Unfortunately we were unable to verify your payment for this booking.",
                "NOT APPROVED",
            ),
            NotificationKind::ClaimRefunded => (
                "Your payment has been refunded and your seats have been released.",
                "REFUNDED",
            ),
        };
        let _ = writeln!(body, "{headline}");
        let _ = writeln!(body);

        let _ = writeln!(body, "BOOKING");
        let _ = writeln!(body, "{RULE}");
        let _ = writeln!(body, "Booking Reference: {}", ctx.booking_reference);
        let _ = writeln!(body, "Transaction ID: {}", ctx.transaction_reference);
        let _ = writeln!(body, "Status: {status}");
        let _ = writeln!(body);

        let _ = writeln!(body, "EVENT");
        let _ = writeln!(body, "{RULE}");
        let _ = writeln!(body, "Event: {}", ctx.event_title);
        let _ = writeln!(body, "Date: {}", ctx.event_date.format("%A, %B %d, %Y"));
        if let Some(time) = ctx.event_time {
            let _ = writeln!(body, "Time: {}", time.format("%I:%M %p"));
        }
        let _ = writeln!(body, "Location: {}", ctx.location);
        let _ = writeln!(body);

        let _ = writeln!(body, "TICKETS");
        let _ = writeln!(body, "{RULE}");
        let _ = writeln!(body, "Ticket Type: {}", ctx.tier);
        let _ = writeln!(body, "Number of Tickets: {}", ctx.quantity);
        let _ = writeln!(body, "Amount: {}", ctx.amount);
        let _ = writeln!(body, "Payment Method: {}", ctx.method);
        if let Some(contact) = &ctx.contact {
            let _ = writeln!(body, "Phone Number: {contact}");
        }
        let _ = writeln!(body);

        match kind {
            NotificationKind::ClaimSubmitted => {
                let _ = writeln!(
                    body,
                    "You will receive another email once your payment has been reviewed."
                );
            },
            NotificationKind::ClaimApproved => {
                let _ = writeln!(body, "- Please arrive at least 30 minutes before the event starts");
                let _ = writeln!(body, "- Bring a valid ID for verification");
                let _ = writeln!(
                    body,
                    "- Present this email or your booking reference {} at the entrance",
                    ctx.booking_reference
                );
            },
            NotificationKind::ClaimRejected => {
                let _ = writeln!(
                    body,
                    "Please contact our support team or book again with a different payment method."
                );
            },
            NotificationKind::ClaimRefunded => {
                let _ = writeln!(body, "The refund covers {} for this booking.", ctx.amount);
            },
        }
        let _ = writeln!(body);

        let _ = writeln!(body, "ORGANIZER");
        let _ = writeln!(body, "{RULE}");
        let _ = writeln!(body, "{}", ctx.organizer_name);
        let _ = writeln!(body, "Phone: {}", ctx.organizer_phone);
        let _ = writeln!(body);

        let _ = writeln!(body, "Questions? Email {} or call {}.", self.config.support_email, self.config.support_phone);
        let _ = writeln!(body);
        let _ = writeln!(body, "Thank you for choosing {}!", self.config.brand);
        let _ = write!(body, "The {} Team", self.config.brand);
        body
    }
}
