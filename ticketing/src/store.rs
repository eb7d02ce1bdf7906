//! Store: serializes commands against the ticketing state and runs their effects.
//!
//! Each [`TicketingStore::send`] takes the write lock, runs the reducer, writes the
//! touched entities to the [`Persistence`] backend and releases the lock before any
//! effect runs. Two approvals of the same claim therefore cannot both pass the status
//! check, a failed write leaves memory as it was before the command, and a slow
//! notification outbox never holds up other commands.

use crate::aggregates::catalog::{slugify, unique_slug};
use crate::aggregates::{
    BookingAction, CatalogAction, PaymentClaim, TicketingAction, TicketingEnvironment,
    TicketingReducer,
};
use crate::error::TicketingError;
use crate::persistence::{Changes, InMemoryPersistence, Persistence};
use crate::types::{Booking, BookingId, Category, ClaimId, Event, EventId, TicketingState};
use futures::future::BoxFuture;
use futures::FutureExt;
use momenta_core::effect::Effect;
use momenta_core::reducer::Reducer;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the ticketing state. Cheap to clone.
#[derive(Clone)]
pub struct TicketingStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: RwLock<TicketingState>,
    reducer: TicketingReducer,
    env: TicketingEnvironment,
    persistence: Arc<dyn Persistence>,
}

impl TicketingStore {
    /// Creates a store with empty state and in-memory persistence.
    #[must_use]
    pub fn new(env: TicketingEnvironment) -> Self {
        Self::with_state(TicketingState::new(), env, Arc::new(InMemoryPersistence::new()))
    }

    /// Creates a store over existing state.
    #[must_use]
    pub fn with_state(
        state: TicketingState,
        env: TicketingEnvironment,
        persistence: Arc<dyn Persistence>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                reducer: TicketingReducer::new(),
                env,
                persistence,
            }),
        }
    }

    /// Creates a store over everything `persistence` holds.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Storage`] if the state cannot be loaded.
    pub async fn open(
        env: TicketingEnvironment,
        persistence: Arc<dyn Persistence>,
    ) -> Result<Self, TicketingError> {
        let state = persistence.load().await?;
        Ok(Self::with_state(state, env, persistence))
    }

    /// Dispatch a command and run its effects.
    ///
    /// # Errors
    ///
    /// Returns the error the reducer recorded for this command, or
    /// [`TicketingError::Storage`] if its changes could not be written. Effects run
    /// only when the command succeeded; failures inside effects are logged, never
    /// returned.
    pub async fn send(&self, action: impl Into<TicketingAction>) -> Result<(), TicketingError> {
        self.send_with(action, |_| ()).await
    }

    /// Dispatch a command and read the committed state before the lock is released.
    ///
    /// `read` sees exactly the state this command produced. A concurrent command
    /// cannot slip in between the commit and the read.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send). `read` is not called on failure.
    pub async fn send_with<T, F>(
        &self,
        action: impl Into<TicketingAction>,
        read: F,
    ) -> Result<T, TicketingError>
    where
        F: FnOnce(&TicketingState) -> T + Send,
        T: Send,
    {
        let action = action.into();
        let (effects, value) = {
            let mut state = self.inner.state.write().await;
            let snapshot = Snapshot::capture(&state, &action);

            state.last_error = None;
            let effects = self.inner.reducer.reduce(&mut state, action, &self.inner.env);
            if let Some(error) = state.last_error.take() {
                return Err(error);
            }

            let changes = snapshot.changes(&state);
            if !changes.is_empty() {
                if let Err(error) = self.inner.persistence.save(&changes).await {
                    tracing::error!(error = %error, "Persisting command failed, rolling back");
                    metrics::counter!("momenta_persistence_failures_total").increment(1);
                    snapshot.restore(&mut state);
                    return Err(error.into());
                }
            }
            (effects, read(&state))
        };

        for effect in effects {
            self.execute(effect).await;
        }
        Ok(value)
    }

    /// Read a projection of the current state.
    pub async fn state<F, T>(&self, projection: F) -> T
    where
        F: FnOnce(&TicketingState) -> T,
    {
        let state = self.inner.state.read().await;
        projection(&state)
    }

    /// The environment commands run with
    #[must_use]
    pub fn environment(&self) -> &TicketingEnvironment {
        &self.inner.env
    }

    fn execute(&self, effect: Effect<TicketingAction>) -> BoxFuture<'_, ()> {
        async move {
            match effect {
                Effect::None => {},
                Effect::Future(future) => {
                    if let Some(action) = future.await {
                        self.feed_back(action).await;
                    }
                },
            }
        }
        .boxed()
    }

    fn feed_back(&self, action: TicketingAction) -> BoxFuture<'_, ()> {
        async move {
            if let Err(error) = self.send(action).await {
                tracing::warn!(code = error.code(), error = %error, "Follow-up action rejected");
            }
        }
        .boxed()
    }
}

/// Entities a command may write, as they were before it ran.
///
/// `None` marks an entity that did not exist yet, so restoring removes it again.
struct Snapshot {
    categories: Vec<(String, Option<Category>)>,
    events: Vec<(EventId, Option<Event>)>,
    bookings: Vec<(BookingId, Option<Booking>)>,
    claims: Vec<(ClaimId, Option<PaymentClaim>)>,
    next_booking_number: u64,
}

impl Snapshot {
    fn capture(state: &TicketingState, action: &TicketingAction) -> Self {
        let mut snapshot = Self {
            categories: Vec::new(),
            events: Vec::new(),
            bookings: Vec::new(),
            claims: Vec::new(),
            next_booking_number: state.next_booking_number,
        };

        match action {
            TicketingAction::Catalog(CatalogAction::RegisterCategory { name }) => {
                let slug = unique_slug(&state.categories, &slugify(name.trim()));
                let before = state.categories.get(&slug).cloned();
                snapshot.categories.push((slug, before));
            },
            TicketingAction::Catalog(CatalogAction::RegisterEvent { event_id, .. }) => {
                snapshot.event(state, *event_id);
            },
            TicketingAction::Booking(BookingAction::CreateBooking {
                booking_id,
                event_id,
                ..
            }) => {
                snapshot.booking(state, *booking_id);
                snapshot.event(state, *event_id);
            },
            TicketingAction::Booking(BookingAction::SubmitClaim {
                claim_id,
                booking_id,
                ..
            }) => {
                snapshot.claim(state, *claim_id);
                snapshot.booking(state, *booking_id);
            },
            TicketingAction::Confirmation(decision) => {
                let claim_id = decision.claim_id();
                snapshot.claim(state, claim_id);
                if let Some(booking_id) = state.claim(&claim_id).map(|claim| claim.booking_id) {
                    snapshot.booking(state, booking_id);
                    if let Some(event_id) = state.booking(&booking_id).map(|booking| booking.event_id) {
                        snapshot.event(state, event_id);
                    }
                }
            },
        }
        snapshot
    }

    fn event(&mut self, state: &TicketingState, id: EventId) {
        self.events.push((id, state.events.get(&id).cloned()));
    }

    fn booking(&mut self, state: &TicketingState, id: BookingId) {
        self.bookings.push((id, state.bookings.get(&id).cloned()));
    }

    fn claim(&mut self, state: &TicketingState, id: ClaimId) {
        self.claims.push((id, state.claims.get(&id).cloned()));
    }

    /// Captured entities whose committed value differs from the captured one.
    fn changes(&self, state: &TicketingState) -> Changes {
        Changes {
            categories: changed(&self.categories, &state.categories),
            events: changed(&self.events, &state.events),
            bookings: changed(&self.bookings, &state.bookings),
            claims: changed(&self.claims, &state.claims),
        }
    }

    fn restore(self, state: &mut TicketingState) {
        put_back(self.categories, &mut state.categories);
        put_back(self.events, &mut state.events);
        put_back(self.bookings, &mut state.bookings);
        put_back(self.claims, &mut state.claims);
        state.next_booking_number = self.next_booking_number;
    }
}

fn changed<K, V>(before: &[(K, Option<V>)], now: &HashMap<K, V>) -> Vec<V>
where
    K: Eq + Hash,
    V: Clone + PartialEq,
{
    before
        .iter()
        .filter_map(|(key, before)| match now.get(key) {
            Some(after) if before.as_ref() != Some(after) => Some(after.clone()),
            _ => None,
        })
        .collect()
}

fn put_back<K, V>(before: Vec<(K, Option<V>)>, map: &mut HashMap<K, V>)
where
    K: Eq + Hash,
{
    for (key, value) in before {
        match value {
            Some(value) => {
                map.insert(key, value);
            },
            None => {
                map.remove(&key);
            },
        }
    }
}

impl std::fmt::Debug for TicketingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketingStore")
            .field("env", &self.inner.env)
            .finish_non_exhaustive()
    }
}
