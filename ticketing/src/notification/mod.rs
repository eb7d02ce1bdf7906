//! Customer notifications about payment claims.
//!
//! Reducers never talk to an email transport. They describe a [`Notification`] and
//! return an effect that drops it into a [`NotificationOutbox`] once the state change
//! is committed. A [`NotificationWorker`] drains the outbox, renders the message with
//! [`EmailTemplates`] and hands it to a [`Notifier`].
//!
//! ```text
//! Reducer ──effect──▶ Outbox (mpsc) ──▶ NotificationWorker ──▶ Notifier (SMTP, console)
//!    │                                        │
//!    └─ status already committed              └─ failures logged, never retried
//! ```
//!
//! Delivery is best effort. A notification that fails to render or send never rolls
//! back, retries, or otherwise touches the transition that produced it.

pub mod console;
pub mod mock;
pub mod outbox;
pub mod templates;
pub mod worker;

pub use console::ConsoleNotifier;
pub use mock::MockNotifier;
pub use outbox::{channel, ChannelOutbox, InMemoryOutbox, NotificationOutbox};
pub use templates::{EmailTemplates, OutboundEmail};
pub use worker::{Delivery, NotificationWorker, WorkerStats};

use crate::aggregates::confirmation::PaymentClaim;
use crate::types::{Booking, Event, Money, PaymentMethod, Tier};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::future::Future;
use thiserror::Error;

/// Which message to send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Claim received, waiting for review
    ClaimSubmitted,
    /// Claim approved, tickets valid
    ClaimApproved,
    /// Claim rejected
    ClaimRejected,
    /// Completed claim refunded
    ClaimRefunded,
}

impl NotificationKind {
    /// Label used in logs and metrics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ClaimSubmitted => "claim_submitted",
            Self::ClaimApproved => "claim_approved",
            Self::ClaimRejected => "claim_rejected",
            Self::ClaimRefunded => "claim_refunded",
        }
    }
}

/// Snapshot of everything a template needs, taken when the transition commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NotificationContext {
    /// Customer's display name
    pub customer_name: String,
    /// Booking reference (`#000042`)
    pub booking_reference: String,
    /// Claim transaction reference (`MTN0123456789`)
    pub transaction_reference: String,
    /// Event title
    pub event_title: String,
    /// Event date
    pub event_date: NaiveDate,
    /// Event start time
    pub event_time: Option<NaiveTime>,
    /// Venue
    pub location: String,
    /// Organizer name
    pub organizer_name: String,
    /// Organizer phone
    pub organizer_phone: String,
    /// Seat tier
    pub tier: Tier,
    /// Number of seats
    pub quantity: u32,
    /// Amount of the claim
    pub amount: Money,
    /// Declared payment method
    pub method: PaymentMethod,
    /// Contact number supplied with a mobile-money claim
    pub contact: Option<String>,
}

/// Outbound message emitted after a claim transition commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Message kind
    pub kind: NotificationKind,
    /// Email address, if the customer has one
    pub recipient: Option<String>,
    /// Template data
    pub context: NotificationContext,
}

impl Notification {
    /// Builds a notification from the committed booking, event and claim.
    #[must_use]
    pub fn for_claim(
        kind: NotificationKind,
        booking: &Booking,
        event: &Event,
        claim: &PaymentClaim,
    ) -> Self {
        Self {
            kind,
            recipient: booking.customer.email.clone(),
            context: NotificationContext {
                customer_name: booking.customer.username.clone(),
                booking_reference: booking.reference(),
                transaction_reference: claim.transaction_reference.clone(),
                event_title: event.title.clone(),
                event_date: event.date,
                event_time: event.time,
                location: event.location.clone(),
                organizer_name: event.organizer_name.clone(),
                organizer_phone: event.organizer_phone.clone(),
                tier: booking.tier,
                quantity: booking.quantity,
                amount: claim.amount,
                method: claim.method,
                contact: claim.contact.clone(),
            },
        }
    }
}

/// Errors from an email transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// The provider refused the message
    #[error("Notification rejected: {reason}")]
    Rejected {
        /// Provider's reason
        reason: String,
    },

    /// Network or protocol failure
    #[error("Notification transport failed: {0}")]
    Transport(String),
}

/// Email transport.
///
/// Implementations deliver an already rendered message. SMTP is out of scope for
/// this crate; [`ConsoleNotifier`] logs instead.
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects or fails to deliver the message.
    fn send(
        &self,
        email: &OutboundEmail,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}
