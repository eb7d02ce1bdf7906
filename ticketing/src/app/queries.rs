//! Read models derived from the ticketing state.

use crate::aggregates::ClaimStatus;
use crate::config::PaymentDestinations;
use crate::error::TicketingError;
use crate::types::{Booking, EventId, Money, PaymentMethod, TicketingState, Tier, UserId};
use serde::Serialize;

/// A booking together with the state of its claim, as shown on a profile page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookingView {
    /// The booking
    #[serde(flatten)]
    pub booking: Booking,
    /// Human-facing reference (`#000042`)
    pub reference: String,
    /// Event title
    pub event_title: String,
    /// Claim status, `None` until a claim is submitted
    pub payment_status: Option<ClaimStatus>,
    /// Claim transaction reference
    pub transaction_reference: Option<String>,
}

/// Confirmed sales for one tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TierSales {
    /// Tier
    pub tier: Tier,
    /// Seats in completed claims
    pub confirmed_tickets: u32,
    /// Sum of completed claim amounts
    pub confirmed_revenue: Money,
    /// Seats left on the ledger
    pub seats_remaining: u32,
}

/// Administrative overview of one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    /// Event
    pub event_id: EventId,
    /// Event title
    pub title: String,
    /// Bookings made, whatever their payment state
    pub bookings: usize,
    /// Claims waiting for review
    pub pending_claims: usize,
    /// Per-tier figures, in display order
    pub tiers: Vec<TierSales>,
    /// Seats in completed claims across tiers
    pub confirmed_tickets: u32,
    /// Revenue from completed claims across tiers
    pub confirmed_revenue: Money,
    /// Seats left across tiers
    pub seats_remaining: u32,
}

/// Where to send money for a method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentInstructions {
    /// Method
    pub method: PaymentMethod,
    /// Provider name
    pub provider: &'static str,
    /// Mobile-money number to pay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    /// Bank name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// Bank account number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// Bank account holder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    /// What the claim must include
    pub requirement: &'static str,
}

impl PaymentInstructions {
    /// Instructions for `method` using the configured destinations
    #[must_use]
    pub fn for_method(method: PaymentMethod, destinations: &PaymentDestinations) -> Self {
        let bank = !method.is_mobile();
        Self {
            method,
            provider: method.display_name(),
            mobile_number: destinations.mobile_number(method).map(str::to_string),
            bank_name: bank.then(|| destinations.bank_name.clone()),
            account_number: bank.then(|| destinations.bank_account_number.clone()),
            account_name: bank.then(|| destinations.bank_account_name.clone()),
            requirement: if bank {
                "Upload or reference your proof of payment"
            } else {
                "Enter the 10-digit number you paid from"
            },
        }
    }
}

/// A customer's bookings, newest first.
#[must_use]
pub fn bookings_for(state: &TicketingState, user: UserId) -> Vec<BookingView> {
    let mut bookings: Vec<&Booking> = state
        .bookings
        .values()
        .filter(|booking| booking.customer.id == user)
        .collect();
    bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at).then(b.number.cmp(&a.number)));

    bookings
        .into_iter()
        .map(|booking| {
            let claim = booking.claim_id.and_then(|id| state.claim(&id));
            BookingView {
                booking: booking.clone(),
                reference: booking.reference(),
                event_title: state
                    .event(&booking.event_id)
                    .map(|event| event.title.clone())
                    .unwrap_or_default(),
                payment_status: claim.map(|claim| claim.status()),
                transaction_reference: claim.map(|claim| claim.transaction_reference.clone()),
            }
        })
        .collect()
}

/// Booking count, pending claims and confirmed sales for an event.
///
/// # Errors
///
/// Returns `EventNotFound` for an unknown event.
pub fn sales_summary(state: &TicketingState, event_id: EventId) -> Result<SalesSummary, TicketingError> {
    let event = state
        .event(&event_id)
        .ok_or(TicketingError::EventNotFound(event_id))?;

    let bookings: Vec<&Booking> = state
        .bookings
        .values()
        .filter(|booking| booking.event_id == event_id)
        .collect();

    let mut pending_claims = 0;
    let mut tiers: Vec<TierSales> = Tier::ALL
        .iter()
        .map(|&tier| TierSales {
            tier,
            confirmed_tickets: 0,
            confirmed_revenue: Money::ZERO,
            seats_remaining: event.inventory.remaining(tier),
        })
        .collect();

    for booking in &bookings {
        let Some(claim) = booking.claim_id.and_then(|id| state.claim(&id)) else {
            continue;
        };
        match claim.status() {
            ClaimStatus::Pending => pending_claims += 1,
            ClaimStatus::Completed => {
                if let Some(sales) = tiers.iter_mut().find(|sales| sales.tier == booking.tier) {
                    sales.confirmed_tickets += booking.quantity;
                    sales.confirmed_revenue = sales.confirmed_revenue.saturating_add(claim.amount);
                }
            },
            ClaimStatus::Failed | ClaimStatus::Refunded => {},
        }
    }

    Ok(SalesSummary {
        event_id,
        title: event.title.clone(),
        bookings: bookings.len(),
        pending_claims,
        confirmed_tickets: tiers.iter().map(|sales| sales.confirmed_tickets).sum(),
        confirmed_revenue: tiers
            .iter()
            .fold(Money::ZERO, |total, sales| total.saturating_add(sales.confirmed_revenue)),
        seats_remaining: event.inventory.total_remaining(),
        tiers,
    })
}
