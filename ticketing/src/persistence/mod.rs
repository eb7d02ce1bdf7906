//! Durable storage behind the [`TicketingStore`](crate::store::TicketingStore).
//!
//! The store keeps the whole ticketing state in memory and writes through to a
//! [`Persistence`] backend after every successful command. A command's changes are
//! written while the store's write lock is still held; if the write fails the store
//! puts the touched entities back the way they were and returns
//! [`TicketingError::Storage`], so memory never runs ahead of the database.
//!
//! - [`PostgresPersistence`]: production backend (sqlx)
//! - [`InMemoryPersistence`]: tests and the demo

pub mod memory;
pub mod postgres;

pub use memory::InMemoryPersistence;
pub use postgres::PostgresPersistence;

use crate::aggregates::PaymentClaim;
use crate::error::TicketingError;
use crate::types::{Booking, Category, Event, TicketingState};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// Connection, query or transaction failure
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be turned back into a domain value
    #[error("Corrupt {table} row: {reason}")]
    Corrupt {
        /// Table the row came from
        table: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// A value does not fit the column it is written to
    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

impl From<PersistenceError> for TicketingError {
    fn from(error: PersistenceError) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Entities written by one command, in their committed form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Changes {
    /// New or updated categories
    pub categories: Vec<Category>,
    /// New or updated events (inventory included)
    pub events: Vec<Event>,
    /// New or updated bookings
    pub bookings: Vec<Booking>,
    /// New or updated claims
    pub claims: Vec<PaymentClaim>,
}

impl Changes {
    /// Nothing to write
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.events.is_empty()
            && self.bookings.is_empty()
            && self.claims.is_empty()
    }
}

/// Future returned by [`Persistence`] methods.
pub type PersistenceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PersistenceError>> + Send + 'a>>;

/// Storage backend for the ticketing state.
///
/// Uses boxed futures so the store can hold an `Arc<dyn Persistence>`.
pub trait Persistence: Send + Sync {
    /// Read everything back, e.g. at startup.
    ///
    /// `next_booking_number` is one past the highest stored booking number.
    fn load(&self) -> PersistenceFuture<'_, TicketingState>;

    /// Upsert `changes` atomically: either all of them are written or none.
    fn save<'a>(&'a self, changes: &'a Changes) -> PersistenceFuture<'a, ()>;
}

/// One past the highest booking number in `state`.
pub(crate) fn next_booking_number(state: &TicketingState) -> u64 {
    state
        .bookings
        .values()
        .map(|booking| booking.number)
        .max()
        .map_or(1, |highest| highest.saturating_add(1))
}
