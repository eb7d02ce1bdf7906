//! In-memory persistence for tests and the demo.

use super::{next_booking_number, Changes, Persistence, PersistenceError, PersistenceFuture};
use crate::types::TicketingState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Keeps written entities in a map per table, like a database would.
///
/// [`fail_writes`](Self::fail_writes) makes every later `save` fail, which is how
/// tests exercise the store's rollback.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    tables: Mutex<TicketingState>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryPersistence {
    /// Creates empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (`true`) or succeed again (`false`).
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful `save` calls
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Copy of everything written so far
    #[must_use]
    pub fn snapshot(&self) -> TicketingState {
        let mut state = self.tables.lock().unwrap_or_else(PoisonError::into_inner).clone();
        state.next_booking_number = next_booking_number(&state);
        state
    }
}

impl Persistence for InMemoryPersistence {
    fn load(&self) -> PersistenceFuture<'_, TicketingState> {
        Box::pin(async move { Ok(self.snapshot()) })
    }

    fn save<'a>(&'a self, changes: &'a Changes) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PersistenceError::Database("writes are disabled".to_string()));
            }

            let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
            for category in &changes.categories {
                tables.categories.insert(category.slug.clone(), category.clone());
            }
            for event in &changes.events {
                tables.events.insert(event.id, event.clone());
            }
            for booking in &changes.bookings {
                tables.bookings.insert(booking.id, booking.clone());
            }
            for claim in &changes.claims {
                tables.claims.insert(claim.id, claim.clone());
            }
            drop(tables);

            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
