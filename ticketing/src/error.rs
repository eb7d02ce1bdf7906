//! Error taxonomy for the ticketing core.
//!
//! Every variant is a failure returned to the caller. None of them is retried, and none
//! leaves partial state behind: reducers validate before they mutate, and the store
//! rolls a command back when its changes cannot be persisted.

use crate::aggregates::confirmation::ClaimStatus;
use crate::types::{BookingId, ClaimId, EventId, PaymentMethod, Tier};
use thiserror::Error;

/// Result type alias for ticketing operations.
pub type Result<T> = std::result::Result<T, TicketingError>;

/// Failures of booking creation, claim submission and claim confirmation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TicketingError {
    // ═══════════════════════════════════════════════════════════
    // Booking
    // ═══════════════════════════════════════════════════════════
    /// Tier is not one of vip, gold, standard.
    #[error("Invalid ticket type: {value}")]
    InvalidTier {
        /// Value supplied by the caller
        value: String,
    },

    /// Quantity outside `1..=max`.
    #[error("Invalid number of tickets: {quantity} (allowed 1 to {max})")]
    InvalidQuantity {
        /// Requested quantity
        quantity: u32,
        /// Configured cap
        max: u32,
    },

    /// Not enough seats left in the tier.
    #[error("Only {available} {tier} seats available")]
    InsufficientInventory {
        /// Tier that ran short
        tier: Tier,
        /// Seats requested
        requested: u32,
        /// Seats remaining
        available: u32,
    },

    // ═══════════════════════════════════════════════════════════
    // Payment claims
    // ═══════════════════════════════════════════════════════════
    /// Payment method is not one of the supported providers.
    #[error("Invalid payment method: {value}")]
    InvalidMethod {
        /// Value supplied by the caller
        value: String,
    },

    /// Mobile-money method without a valid 10-digit contact number.
    #[error("{method} payments require a 10-digit phone number")]
    MissingContact {
        /// Method that needs the contact
        method: PaymentMethod,
    },

    /// A claim already exists for the booking.
    #[error("Booking {booking_id} already has a payment claim")]
    DuplicateClaim {
        /// Booking that already has a claim
        booking_id: BookingId,
    },

    /// Requested status change is not an edge of the state machine.
    #[error("Payment is already {from}; cannot move to {to}")]
    IllegalTransition {
        /// Current status
        from: ClaimStatus,
        /// Requested status
        to: ClaimStatus,
    },

    // ═══════════════════════════════════════════════════════════
    // Lookup and authorization
    // ═══════════════════════════════════════════════════════════
    /// Event registration rejected.
    #[error("Invalid event: {reason}")]
    InvalidEvent {
        /// Why the event was rejected
        reason: String,
    },

    /// Category registration rejected.
    #[error("Invalid category: {reason}")]
    InvalidCategory {
        /// Why the category was rejected
        reason: String,
    },

    /// Unknown category slug.
    #[error("Category {0} not found")]
    CategoryNotFound(String),

    /// Unknown event.
    #[error("Event {0} not found")]
    EventNotFound(EventId),

    /// Unknown booking.
    #[error("Booking {0} not found")]
    BookingNotFound(BookingId),

    /// Unknown claim.
    #[error("Payment claim {0} not found")]
    ClaimNotFound(ClaimId),

    /// Actor lacks the administrator capability.
    #[error("{actor} is not allowed to review payments")]
    Forbidden {
        /// Username of the actor
        actor: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Storage
    // ═══════════════════════════════════════════════════════════
    /// The change could not be written; in-memory state was rolled back.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TicketingError {
    /// Stable machine-readable code, used by the HTTP layer and metrics labels.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidTier { .. } => "INVALID_TIER",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InsufficientInventory { .. } => "INSUFFICIENT_INVENTORY",
            Self::InvalidMethod { .. } => "INVALID_METHOD",
            Self::MissingContact { .. } => "MISSING_CONTACT",
            Self::DuplicateClaim { .. } => "DUPLICATE_CLAIM",
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::InvalidEvent { .. } => "INVALID_EVENT",
            Self::InvalidCategory { .. } => "INVALID_CATEGORY",
            Self::CategoryNotFound(_)
            | Self::EventNotFound(_)
            | Self::BookingNotFound(_)
            | Self::ClaimNotFound(_) => "NOT_FOUND",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}
