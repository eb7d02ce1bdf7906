//! Reducers for the Momenta ticketing core.
//!
//! - Catalog: event registration with initial seat counts
//! - Inventory: per-tier remaining seats (ledger, no reducer of its own)
//! - Booking: booking creation and payment claim submission
//! - Confirmation: the approve / reject / refund state machine
//!
//! [`TicketingReducer`] composes them over the shared [`TicketingState`].

pub mod booking;
pub mod catalog;
pub mod confirmation;
pub mod environment;
pub mod inventory;

pub use booking::{BookingAction, BookingReducer};
pub use catalog::{CatalogAction, CatalogReducer, NewEvent};
pub use confirmation::{AuditNote, ClaimStatus, ConfirmationAction, ConfirmationReducer, PaymentClaim};
pub use environment::{RandomReferences, ReferenceGenerator, SequentialReferences, TicketingEnvironment};
pub use inventory::{ConsumeOutcome, ConsumePolicy, EventInventory};

use crate::types::TicketingState;
use momenta_core::{effect::Effect, reducer::Reducer, SmallVec};

/// Every command the ticketing store accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketingAction {
    /// Event registration
    Catalog(CatalogAction),
    /// Bookings and claim submission
    Booking(BookingAction),
    /// Administrative decisions on claims
    Confirmation(ConfirmationAction),
}

impl From<CatalogAction> for TicketingAction {
    fn from(action: CatalogAction) -> Self {
        Self::Catalog(action)
    }
}

impl From<BookingAction> for TicketingAction {
    fn from(action: BookingAction) -> Self {
        Self::Booking(action)
    }
}

impl From<ConfirmationAction> for TicketingAction {
    fn from(action: ConfirmationAction) -> Self {
        Self::Confirmation(action)
    }
}

/// Routes each action to the reducer that owns it.
#[derive(Clone, Debug, Default)]
pub struct TicketingReducer {
    catalog: CatalogReducer,
    booking: BookingReducer,
    confirmation: ConfirmationReducer,
}

impl TicketingReducer {
    /// Creates a new `TicketingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            catalog: CatalogReducer::new(),
            booking: BookingReducer::new(),
            confirmation: ConfirmationReducer::new(),
        }
    }
}

impl Reducer for TicketingReducer {
    type State = TicketingState;
    type Action = TicketingAction;
    type Environment = TicketingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TicketingAction::Catalog(action) => self
                .catalog
                .reduce(state, action, env)
                .into_iter()
                .map(|effect| effect.map(TicketingAction::Catalog))
                .collect(),
            TicketingAction::Booking(action) => self
                .booking
                .reduce(state, action, env)
                .into_iter()
                .map(|effect| effect.map(TicketingAction::Booking))
                .collect(),
            TicketingAction::Confirmation(action) => self
                .confirmation
                .reduce(state, action, env)
                .into_iter()
                .map(|effect| effect.map(TicketingAction::Confirmation))
                .collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::notification::InMemoryOutbox;
    use crate::types::{BookingId, ClaimId, Customer, EventId, PaymentMethod, Tier, UserId};
    use chrono::NaiveDate;
    use momenta_testing::test_clock;
    use std::sync::Arc;

    pub fn test_env() -> (TicketingEnvironment, Arc<InMemoryOutbox>) {
        let outbox = Arc::new(InMemoryOutbox::new());
        let env = TicketingEnvironment::new(Arc::new(test_clock()), outbox.clone())
            .with_references(Arc::new(SequentialReferences::starting_at(1)));
        (env, outbox)
    }

    pub fn customer(username: &str) -> Customer {
        Customer::new(UserId::new(), username, Some(format!("{username}@example.com")))
    }

    pub fn new_event(title: &str, vip: u32, gold: u32, standard: u32) -> NewEvent {
        NewEvent {
            category: "music".to_string(),
            title: title.to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap_or_default(),
            time: None,
            location: "Mulungushi Conference Centre".to_string(),
            organizer_name: "Nalisa Events".to_string(),
            organizer_phone: "0977000000".to_string(),
            vip_seats: vip,
            gold_seats: gold,
            standard_seats: standard,
        }
    }

    /// A state holding the `music` category.
    pub fn state_with_category() -> TicketingState {
        let mut state = TicketingState::new();
        let _ = CatalogReducer::new().reduce(
            &mut state,
            CatalogAction::RegisterCategory {
                name: "Music".to_string(),
            },
            &test_env().0,
        );
        state
    }

    /// A state with one event holding `seats` in every tier.
    pub fn state_with_event(seats: u32) -> (TicketingState, EventId) {
        let mut state = state_with_category();
        let event_id = EventId::new();
        let _ = CatalogReducer::new().reduce(
            &mut state,
            CatalogAction::RegisterEvent {
                event_id,
                event: new_event("Lusaka Jazz Night", seats, seats, seats),
            },
            &test_env().0,
        );
        (state, event_id)
    }

    /// A state with one booking of `quantity` seats in `tier` and its pending claim.
    pub fn pending_claim_state(seats: u32, tier: Tier, quantity: u32) -> (TicketingState, ClaimId, EventId) {
        let (mut state, event_id) = state_with_event(seats);
        let env = test_env().0;
        let booking_id = BookingId::new();
        let claim_id = ClaimId::new();
        let reducer = BookingReducer::new();

        let _ = reducer.reduce(
            &mut state,
            BookingAction::CreateBooking {
                booking_id,
                customer: customer("mwila"),
                event_id,
                tier,
                quantity,
            },
            &env,
        );
        let _ = reducer.reduce(
            &mut state,
            BookingAction::SubmitClaim {
                claim_id,
                booking_id,
                method: PaymentMethod::Airtel,
                declared_amount: None,
                contact: Some("0977123456".to_string()),
                proof: None,
            },
            &env,
        );
        debug_assert!(state.last_error.is_none());
        (state, claim_id, event_id)
    }
}
