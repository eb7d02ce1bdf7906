//! Ticketing service: the operations callers use, with string inputs parsed here.
//!
//! Each command goes through the [`TicketingStore`]:
//! 1. Parse and convert caller input (tier, payment method)
//! 2. Dispatch the command (validation, mutation, persistence and effects happen in
//!    the store)
//! 3. Return the entity as the command left it, read before the store's lock is
//!    released

use crate::aggregates::{
    BookingAction, CatalogAction, ClaimStatus, ConfirmationAction, NewEvent, PaymentClaim,
    TicketingEnvironment,
};
use crate::app::queries::{self, BookingView, PaymentInstructions, SalesSummary};
use crate::config::{Config, PaymentDestinations};
use crate::error::{Result, TicketingError};
use crate::notification::NotificationOutbox;
use crate::persistence::Persistence;
use crate::store::TicketingStore;
use crate::types::{
    Actor, Booking, BookingId, Category, ClaimId, Customer, Event, EventId, Money, PaymentMethod,
    TicketingState, Tier, UserId,
};
use momenta_core::environment::SystemClock;
use serde::Serialize;
use std::sync::Arc;

/// A claim a bulk decision did not apply to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedClaim {
    /// Claim ID
    pub claim_id: ClaimId,
    /// Error code
    pub code: &'static str,
    /// Error message
    pub message: String,
}

/// Result of approving or rejecting several claims at once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Claims that transitioned
    pub applied: Vec<ClaimId>,
    /// Claims left as they were
    pub skipped: Vec<SkippedClaim>,
}

/// A category with the number of events listed under it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    /// Slug
    pub slug: String,
    /// Display name
    pub name: String,
    /// Events in the category
    pub event_count: usize,
}

/// Entry point for bookings, claims and their review.
#[derive(Clone, Debug)]
pub struct TicketingService {
    store: TicketingStore,
    payments: PaymentDestinations,
}

impl TicketingService {
    /// Create a service over an existing store
    #[must_use]
    pub const fn new(store: TicketingStore, payments: PaymentDestinations) -> Self {
        Self { store, payments }
    }

    /// Wall clock, random references and configured booking rules over in-memory
    /// persistence.
    #[must_use]
    pub fn from_config(config: &Config, outbox: Arc<dyn NotificationOutbox>) -> Self {
        let env = TicketingEnvironment::from_config(&config.booking, Arc::new(SystemClock), outbox);
        Self::new(TicketingStore::new(env), config.payments.clone())
    }

    /// Production wiring: like [`from_config`](Self::from_config), with the state
    /// loaded from and written to `persistence`.
    ///
    /// # Errors
    ///
    /// `Storage` if the stored state cannot be loaded.
    pub async fn open(
        config: &Config,
        outbox: Arc<dyn NotificationOutbox>,
        persistence: Arc<dyn Persistence>,
    ) -> Result<Self> {
        let env = TicketingEnvironment::from_config(&config.booking, Arc::new(SystemClock), outbox);
        let store = TicketingStore::open(env, persistence).await?;
        Ok(Self::new(store, config.payments.clone()))
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TicketingStore {
        &self.store
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Register a category. Its slug is derived from the name.
    ///
    /// # Errors
    ///
    /// `InvalidCategory` for a blank, overlong or already registered name.
    pub async fn register_category(&self, name: &str) -> Result<Category> {
        let name = name.trim().to_string();
        let lookup = name.clone();
        self.store
            .send_with(CatalogAction::RegisterCategory { name: name.clone() }, move |state| {
                state
                    .categories
                    .values()
                    .find(|category| category.name == lookup)
                    .cloned()
            })
            .await?
            .ok_or(TicketingError::CategoryNotFound(name))
    }

    /// Register an event with its initial seat counts.
    ///
    /// # Errors
    ///
    /// `CategoryNotFound` for an unknown category slug, `InvalidEvent` for a blank title.
    pub async fn register_event(&self, event: NewEvent) -> Result<Event> {
        let event_id = EventId::new();
        self.store
            .send_with(CatalogAction::RegisterEvent { event_id, event }, move |state| {
                state.event(&event_id).cloned()
            })
            .await?
            .ok_or(TicketingError::EventNotFound(event_id))
    }

    /// Book `quantity` seats of `tier` at the current price.
    ///
    /// # Errors
    ///
    /// `InvalidTier`, `InvalidQuantity`, `InsufficientInventory` or `EventNotFound`.
    pub async fn create_booking(
        &self,
        customer: Customer,
        event_id: EventId,
        tier: &str,
        quantity: u32,
    ) -> Result<Booking> {
        let tier: Tier = tier.parse()?;
        let booking_id = BookingId::new();
        self.store
            .send_with(
                BookingAction::CreateBooking {
                    booking_id,
                    customer,
                    event_id,
                    tier,
                    quantity,
                },
                move |state| state.booking(&booking_id).cloned(),
            )
            .await?
            .ok_or(TicketingError::BookingNotFound(booking_id))
    }

    /// Declare payment for a booking. The claim starts `pending`.
    ///
    /// # Errors
    ///
    /// `InvalidMethod`, `MissingContact`, `DuplicateClaim` or `BookingNotFound`.
    pub async fn submit_claim(
        &self,
        booking_id: BookingId,
        method: &str,
        amount: Option<Money>,
        contact: Option<String>,
        proof: Option<String>,
    ) -> Result<PaymentClaim> {
        let method: PaymentMethod = method.parse()?;
        let claim_id = ClaimId::new();
        self.store
            .send_with(
                BookingAction::SubmitClaim {
                    claim_id,
                    booking_id,
                    method,
                    declared_amount: amount,
                    contact,
                    proof,
                },
                move |state| committed_claim(state, claim_id),
            )
            .await?
    }

    /// `pending → completed`, consuming the booking's seats.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `ClaimNotFound`, `IllegalTransition`, or `InsufficientInventory`
    /// under the strict consume policy.
    pub async fn approve(&self, claim_id: ClaimId, actor: &Actor) -> Result<PaymentClaim> {
        self.store
            .send_with(
                ConfirmationAction::Approve {
                    claim_id,
                    actor: actor.clone(),
                },
                move |state| committed_claim(state, claim_id),
            )
            .await?
    }

    /// `pending → failed`.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `ClaimNotFound` or `IllegalTransition`.
    pub async fn reject(&self, claim_id: ClaimId, actor: &Actor) -> Result<PaymentClaim> {
        self.store
            .send_with(
                ConfirmationAction::Reject {
                    claim_id,
                    actor: actor.clone(),
                },
                move |state| committed_claim(state, claim_id),
            )
            .await?
    }

    /// `completed → refunded`, restoring the booking's seats.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `ClaimNotFound` or `IllegalTransition`.
    pub async fn refund(&self, claim_id: ClaimId, actor: &Actor) -> Result<PaymentClaim> {
        self.store
            .send_with(
                ConfirmationAction::Refund {
                    claim_id,
                    actor: actor.clone(),
                },
                move |state| committed_claim(state, claim_id),
            )
            .await?
    }

    /// Approve every pending claim in `claim_ids`; anything else is skipped.
    ///
    /// # Errors
    ///
    /// `Forbidden` if `actor` is not an administrator. Per-claim failures are reported
    /// in the outcome.
    pub async fn approve_all(&self, claim_ids: &[ClaimId], actor: &Actor) -> Result<BulkOutcome> {
        self.decide_all(claim_ids, actor, |claim_id, actor| ConfirmationAction::Approve {
            claim_id,
            actor,
        })
        .await
    }

    /// Reject every pending claim in `claim_ids`; anything else is skipped.
    ///
    /// # Errors
    ///
    /// `Forbidden` if `actor` is not an administrator.
    pub async fn reject_all(&self, claim_ids: &[ClaimId], actor: &Actor) -> Result<BulkOutcome> {
        self.decide_all(claim_ids, actor, |claim_id, actor| ConfirmationAction::Reject {
            claim_id,
            actor,
        })
        .await
    }


    async fn decide_all<F>(&self, claim_ids: &[ClaimId], actor: &Actor, action: F) -> Result<BulkOutcome>
    where
        F: Fn(ClaimId, Actor) -> ConfirmationAction,
    {
        if !actor.is_admin {
            return Err(TicketingError::Forbidden {
                actor: actor.username.clone(),
            });
        }

        let mut outcome = BulkOutcome::default();
        for &claim_id in claim_ids {
            match self.store.send(action(claim_id, actor.clone())).await {
                Ok(()) => outcome.applied.push(claim_id),
                Err(error) => outcome.skipped.push(SkippedClaim {
                    claim_id,
                    code: error.code(),
                    message: error.to_string(),
                }),
            }
        }
        tracing::info!(
            actor = %actor.username,
            applied = outcome.applied.len(),
            skipped = outcome.skipped.len(),
            "Bulk claim decision"
        );
        Ok(outcome)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All events, soonest first.
    pub async fn events(&self) -> Vec<Event> {
        self.store
            .state(|state| {
                let mut events: Vec<Event> = state.events.values().cloned().collect();
                events.sort_by(|a, b| (a.date, a.time, &a.title).cmp(&(b.date, b.time, &b.title)));
                events
            })
            .await
    }

    /// Every category with its event count, by name.
    pub async fn categories(&self) -> Vec<CategorySummary> {
        self.store
            .state(|state| {
                let mut categories: Vec<CategorySummary> = state
                    .categories
                    .values()
                    .map(|category| CategorySummary {
                        slug: category.slug.clone(),
                        name: category.name.clone(),
                        event_count: state
                            .events
                            .values()
                            .filter(|event| event.category == category.slug)
                            .count(),
                    })
                    .collect();
                categories.sort_by(|a, b| a.name.cmp(&b.name));
                categories
            })
            .await
    }

    /// A category and its events, latest date first.
    ///
    /// # Errors
    ///
    /// `CategoryNotFound`.
    pub async fn category_events(&self, slug: &str) -> Result<(Category, Vec<Event>)> {
        self.store
            .state(|state| {
                let category = state
                    .category(slug)
                    .cloned()
                    .ok_or_else(|| TicketingError::CategoryNotFound(slug.to_string()))?;
                let mut events: Vec<Event> = state
                    .events
                    .values()
                    .filter(|event| event.category == category.slug)
                    .cloned()
                    .collect();
                events.sort_by(|a, b| (b.date, b.time, &a.title).cmp(&(a.date, a.time, &b.title)));
                Ok((category, events))
            })
            .await
    }

    /// One event.
    ///
    /// # Errors
    ///
    /// `EventNotFound`.
    pub async fn event(&self, event_id: EventId) -> Result<Event> {
        self.store
            .state(|state| state.event(&event_id).cloned())
            .await
            .ok_or(TicketingError::EventNotFound(event_id))
    }

    /// One booking.
    ///
    /// # Errors
    ///
    /// `BookingNotFound`.
    pub async fn booking(&self, booking_id: BookingId) -> Result<Booking> {
        self.store
            .state(|state| state.booking(&booking_id).cloned())
            .await
            .ok_or(TicketingError::BookingNotFound(booking_id))
    }

    /// A customer's bookings with their payment state, newest first.
    pub async fn bookings_for(&self, user: UserId) -> Vec<BookingView> {
        self.store.state(|state| queries::bookings_for(state, user)).await
    }

    /// Claims, optionally filtered by status, newest first.
    pub async fn claims(&self, status: Option<ClaimStatus>) -> Vec<PaymentClaim> {
        self.store
            .state(|state| {
                let mut claims: Vec<PaymentClaim> = state
                    .claims
                    .values()
                    .filter(|claim| status.is_none_or(|status| claim.status() == status))
                    .cloned()
                    .collect();
                claims.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| b.transaction_reference.cmp(&a.transaction_reference))
                });
                claims
            })
            .await
    }

    /// One claim.
    ///
    /// # Errors
    ///
    /// `ClaimNotFound`.
    pub async fn claim(&self, claim_id: ClaimId) -> Result<PaymentClaim> {
        self.store
            .state(|state| state.claim(&claim_id).cloned())
            .await
            .ok_or(TicketingError::ClaimNotFound(claim_id))
    }

    /// Sales overview for an event.
    ///
    /// # Errors
    ///
    /// `EventNotFound`.
    pub async fn sales_summary(&self, event_id: EventId) -> Result<SalesSummary> {
        self.store
            .state(|state| queries::sales_summary(state, event_id))
            .await
    }

    /// Where to send money for `method`.
    ///
    /// # Errors
    ///
    /// `InvalidMethod`.
    pub fn payment_instructions(&self, method: &str) -> Result<PaymentInstructions> {
        let method: PaymentMethod = method.parse()?;
        Ok(PaymentInstructions::for_method(method, &self.payments))
    }
}

fn committed_claim(state: &TicketingState, claim_id: ClaimId) -> Result<PaymentClaim> {
    state
        .claim(&claim_id)
        .cloned()
        .ok_or(TicketingError::ClaimNotFound(claim_id))
}
