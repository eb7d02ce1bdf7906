//! Booking creation and payment claim submission.
//!
//! Creating a booking only checks the inventory; no seat is taken until an
//! administrator approves the claim (see [`confirmation`](super::confirmation)).

use crate::aggregates::confirmation::{ClaimSubmission, PaymentClaim};
use crate::aggregates::environment::TicketingEnvironment;
use crate::error::TicketingError;
use crate::notification::{Notification, NotificationKind};
use crate::types::{Booking, BookingId, ClaimId, Customer, EventId, Money, PaymentMethod, TicketingState, Tier};
use momenta_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};

/// Attempts at finding an unused transaction reference before accepting a collision.
const MAX_REFERENCE_ATTEMPTS: usize = 5;

/// Actions for bookings and their payment claims
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingAction {
    /// Book seats of one tier at the current price
    CreateBooking {
        /// ID for the new booking
        booking_id: BookingId,
        /// Who is booking
        customer: Customer,
        /// Event to book
        event_id: EventId,
        /// Seat tier
        tier: Tier,
        /// Number of seats
        quantity: u32,
    },

    /// Declare payment for a booking
    SubmitClaim {
        /// ID for the new claim
        claim_id: ClaimId,
        /// Booking paid for
        booking_id: BookingId,
        /// Declared method
        method: PaymentMethod,
        /// Amount the customer says they paid; replaced by the booking total
        declared_amount: Option<Money>,
        /// Number the money was sent from (mobile methods)
        contact: Option<String>,
        /// Proof-of-payment reference (bank)
        proof: Option<String>,
    },
}

/// Reducer for bookings and claim submission
#[derive(Clone, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn create_booking(
        state: &mut TicketingState,
        booking_id: BookingId,
        customer: Customer,
        event_id: EventId,
        tier: Tier,
        quantity: u32,
        env: &TicketingEnvironment,
    ) -> Result<(), TicketingError> {
        let event = state
            .event(&event_id)
            .ok_or(TicketingError::EventNotFound(event_id))?;

        let invalid_quantity = TicketingError::InvalidQuantity {
            quantity,
            max: env.max_quantity,
        };
        if quantity == 0 || quantity > env.max_quantity {
            return Err(invalid_quantity);
        }

        if !event.inventory.reserve_check(tier, quantity) {
            return Err(TicketingError::InsufficientInventory {
                tier,
                requested: quantity,
                available: event.inventory.remaining(tier),
            });
        }

        let unit_price = env.prices.price(tier);
        let total_price = env.prices.total(tier, quantity).ok_or(invalid_quantity)?;

        let number = state.next_booking_number;
        state.next_booking_number += 1;

        let booking = Booking {
            id: booking_id,
            number,
            customer,
            event_id,
            tier,
            quantity,
            unit_price,
            total_price,
            booked_at: env.clock.now(),
            claim_id: None,
        };

        metrics::counter!("momenta_bookings_total", "tier" => tier.as_str()).increment(1);
        tracing::info!(
            booking = %booking.reference(),
            customer = %booking.customer.username,
            event_id = %event_id,
            tier = tier.as_str(),
            quantity,
            total = %total_price,
            "Booking created"
        );

        state.bookings.insert(booking_id, booking);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn submit_claim(
        state: &mut TicketingState,
        claim_id: ClaimId,
        booking_id: BookingId,
        method: PaymentMethod,
        declared_amount: Option<Money>,
        contact: Option<String>,
        proof: Option<String>,
        env: &TicketingEnvironment,
    ) -> Result<Notification, TicketingError> {
        let booking = state
            .booking(&booking_id)
            .ok_or(TicketingError::BookingNotFound(booking_id))?;
        if booking.claim_id.is_some() {
            return Err(TicketingError::DuplicateClaim { booking_id });
        }
        let event = state
            .event(&booking.event_id)
            .ok_or(TicketingError::EventNotFound(booking.event_id))?;

        let (contact, proof_reference) = if method.is_mobile() {
            (Some(valid_contact(method, contact.as_deref())?), None)
        } else {
            let proof = proof
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty());
            (None, proof)
        };

        let amount = booking.total_price;
        let mut notes = vec![format!(
            "Payment initiated by {}. Awaiting admin confirmation.",
            booking.customer.username
        )];
        if let Some(declared) = declared_amount.filter(|declared| *declared != amount) {
            tracing::warn!(
                booking = %booking.reference(),
                declared = %declared,
                total = %amount,
                "Declared amount differs from booking total; using booking total"
            );
            notes.push(format!(
                "Declared amount {declared} replaced by booking total {amount}"
            ));
        }

        let transaction_reference = unused_reference(state, method, env);
        let now = env.clock.now();
        let claim = PaymentClaim::submitted(
            ClaimSubmission {
                id: claim_id,
                booking_id,
                method,
                amount,
                contact,
                proof_reference,
                transaction_reference,
            },
            &booking.customer.username,
            notes,
            now,
        );

        let notification =
            Notification::for_claim(NotificationKind::ClaimSubmitted, booking, event, &claim);

        metrics::counter!("momenta_claims_total", "status" => "pending").increment(1);
        tracing::info!(
            claim_id = %claim_id,
            transaction = %claim.transaction_reference,
            booking = %booking.reference(),
            method = method.as_str(),
            amount = %amount,
            "Payment claim submitted"
        );

        state.claims.insert(claim_id, claim);
        if let Some(booking) = state.bookings.get_mut(&booking_id) {
            booking.claim_id = Some(claim_id);
        }
        Ok(notification)
    }
}

/// Mobile-money claims need the 10-digit number the money came from.
fn valid_contact(method: PaymentMethod, contact: Option<&str>) -> Result<String, TicketingError> {
    let contact = contact.map(str::trim).unwrap_or_default();
    if contact.len() == 10 && contact.bytes().all(|b| b.is_ascii_digit()) {
        Ok(contact.to_string())
    } else {
        Err(TicketingError::MissingContact { method })
    }
}

fn unused_reference(
    state: &TicketingState,
    method: PaymentMethod,
    env: &TicketingEnvironment,
) -> String {
    let mut candidate = env.references.generate(method);
    for _ in 1..MAX_REFERENCE_ATTEMPTS {
        if !state.reference_taken(&candidate) {
            return candidate;
        }
        candidate = env.references.generate(method);
    }
    if state.reference_taken(&candidate) {
        tracing::warn!(reference = %candidate, "Transaction reference collision not resolved");
    }
    candidate
}

impl Reducer for BookingReducer {
    type State = TicketingState;
    type Action = BookingAction;
    type Environment = TicketingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            BookingAction::CreateBooking {
                booking_id,
                customer,
                event_id,
                tier,
                quantity,
            } => {
                if let Err(error) =
                    Self::create_booking(state, booking_id, customer, event_id, tier, quantity, env)
                {
                    state.fail(error);
                }
                SmallVec::new()
            },

            BookingAction::SubmitClaim {
                claim_id,
                booking_id,
                method,
                declared_amount,
                contact,
                proof,
            } => match Self::submit_claim(
                state,
                claim_id,
                booking_id,
                method,
                declared_amount,
                contact,
                proof,
                env,
            ) {
                Ok(notification) => smallvec![env.notify(notification)],
                Err(error) => {
                    state.fail(error);
                    SmallVec::new()
                },
            },
        }
    }
}
