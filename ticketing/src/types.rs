//! Domain types for the Momenta ticketing core.
//!
//! Value objects (identifiers, money, tiers, payment methods), the event and booking
//! entities, and the aggregate state every reducer operates on.

use crate::aggregates::confirmation::PaymentClaim;
use crate::aggregates::inventory::EventInventory;
use crate::error::TicketingError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for an event
    EventId
}

uuid_id! {
    /// Unique identifier for a booking
    BookingId
}

uuid_id! {
    /// Unique identifier for a payment claim
    ClaimId
}

uuid_id! {
    /// Unique identifier for a user (customer or administrator)
    UserId
}

// ============================================================================
// Money
// ============================================================================

/// Amount in whole Kwacha.
///
/// Ticket prices are whole numbers, so there is no minor unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero Kwacha
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from whole Kwacha
    #[must_use]
    pub const fn new(kwacha: u64) -> Self {
        Self(kwacha)
    }

    /// Returns the amount in whole Kwacha
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.0
    }

    /// Multiplies by a quantity, `None` on overflow
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two amounts, saturating at `u64::MAX`
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Money {
    /// Formats as `K1,500`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "K{grouped}")
    }
}

// ============================================================================
// Tier
// ============================================================================

/// Ticket category. Each tier has its own price and remaining-seat counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// VIP seating
    Vip,
    /// Gold seating
    Gold,
    /// Standard seating
    Standard,
}

impl Tier {
    /// Every tier, in display order.
    pub const ALL: [Self; 3] = [Self::Vip, Self::Gold, Self::Standard];

    /// Wire name (`vip`, `gold`, `standard`)
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vip => "vip",
            Self::Gold => "gold",
            Self::Standard => "standard",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Vip => "VIP",
            Self::Gold => "Gold",
            Self::Standard => "Standard",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tier {
    type Err = TicketingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vip" => Ok(Self::Vip),
            "gold" => Ok(Self::Gold),
            "standard" => Ok(Self::Standard),
            _ => Err(TicketingError::InvalidTier {
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Payment method
// ============================================================================

/// How the customer says they paid.
///
/// Three mobile-money providers plus bank transfer. No gateway is contacted; the
/// method only decides which details the claim must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// MTN Mobile Money
    Mtn,
    /// Airtel Money
    Airtel,
    /// Zamtel Money
    Zamtel,
    /// Bank transfer with proof of payment
    Bank,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [Self; 4] = [Self::Mtn, Self::Airtel, Self::Zamtel, Self::Bank];

    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mtn => "mtn",
            Self::Airtel => "airtel",
            Self::Zamtel => "zamtel",
            Self::Bank => "bank",
        }
    }

    /// Provider name shown to customers
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Mtn => "MTN Mobile Money",
            Self::Airtel => "Airtel Money",
            Self::Zamtel => "Zamtel Money",
            Self::Bank => "Bank Transfer",
        }
    }

    /// Three-letter prefix of the transaction reference
    #[must_use]
    pub const fn reference_prefix(&self) -> &'static str {
        match self {
            Self::Mtn => "MTN",
            Self::Airtel => "AIR",
            Self::Zamtel => "ZAM",
            Self::Bank => "BAN",
        }
    }

    /// Mobile-money methods require a contact number
    #[must_use]
    pub const fn is_mobile(&self) -> bool {
        !matches!(self, Self::Bank)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PaymentMethod {
    type Err = TicketingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mtn" => Ok(Self::Mtn),
            "airtel" => Ok(Self::Airtel),
            "zamtel" => Ok(Self::Zamtel),
            "bank" => Ok(Self::Bank),
            _ => Err(TicketingError::InvalidMethod {
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// People
// ============================================================================

/// The customer who owns a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// User identity
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Where notifications go, if known
    pub email: Option<String>,
}

impl Customer {
    /// Creates a customer
    #[must_use]
    pub fn new(id: UserId, username: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email,
        }
    }
}

/// Authenticated caller of an administrative operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User identity
    pub id: UserId,
    /// Login name, written into audit notes
    pub username: String,
    /// Administrator capability
    pub is_admin: bool,
}

impl Actor {
    /// An administrator
    #[must_use]
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            is_admin: true,
        }
    }

    /// A regular user
    #[must_use]
    pub fn user(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_admin: false,
        }
    }
}

// ============================================================================
// Category
// ============================================================================

/// A group of events such as music or sports, addressed by its slug.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// URL-safe key, unique
    pub slug: String,
    /// Display name, unique
    pub name: String,
}

// ============================================================================
// Event
// ============================================================================

/// An event with its per-tier seat inventory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Slug of the category the event is listed under
    pub category: String,
    /// Title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Date of the event
    pub date: NaiveDate,
    /// Start time, if announced
    pub time: Option<NaiveTime>,
    /// Venue
    pub location: String,
    /// Organizer name
    pub organizer_name: String,
    /// Organizer phone
    pub organizer_phone: String,
    /// Remaining seats per tier
    pub inventory: EventInventory,
}

// ============================================================================
// Booking
// ============================================================================

/// A customer's claim on seats of one tier, priced at creation time.
///
/// `unit_price` and `total_price` are frozen when the booking is created; later
/// changes to the price table never touch them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Sequential number used for the human-facing reference
    pub number: u64,
    /// Owner
    pub customer: Customer,
    /// Event booked
    pub event_id: EventId,
    /// Seat tier
    pub tier: Tier,
    /// Number of seats
    pub quantity: u32,
    /// Price per seat at booking time
    pub unit_price: Money,
    /// `quantity * unit_price`
    pub total_price: Money,
    /// When the booking was made
    pub booked_at: DateTime<Utc>,
    /// Payment claim attached to this booking, if submitted
    pub claim_id: Option<ClaimId>,
}

impl Booking {
    /// Reference shown to the customer, e.g. `#000042`
    #[must_use]
    pub fn reference(&self) -> String {
        format!("#{:06}", self.number)
    }
}

// ============================================================================
// Aggregate state
// ============================================================================

/// Everything the ticketing reducers read and write.
#[derive(Clone, Debug, Default)]
pub struct TicketingState {
    /// Categories by slug
    pub categories: HashMap<String, Category>,
    /// Registered events
    pub events: HashMap<EventId, Event>,
    /// Bookings by ID
    pub bookings: HashMap<BookingId, Booking>,
    /// Payment claims by ID
    pub claims: HashMap<ClaimId, PaymentClaim>,
    /// Number handed to the next booking
    pub next_booking_number: u64,
    /// Error from the most recent command, cleared by the store before each dispatch
    pub last_error: Option<TicketingError>,
}

impl TicketingState {
    /// Creates an empty state
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_booking_number: 1,
            ..Self::default()
        }
    }

    /// Look up a category by slug
    #[must_use]
    pub fn category(&self, slug: &str) -> Option<&Category> {
        self.categories.get(slug)
    }

    /// Look up an event
    #[must_use]
    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.events.get(id)
    }

    /// Look up a booking
    #[must_use]
    pub fn booking(&self, id: &BookingId) -> Option<&Booking> {
        self.bookings.get(id)
    }

    /// Look up a claim
    #[must_use]
    pub fn claim(&self, id: &ClaimId) -> Option<&PaymentClaim> {
        self.claims.get(id)
    }

    /// Whether a transaction reference is already in use
    #[must_use]
    pub fn reference_taken(&self, reference: &str) -> bool {
        self.claims
            .values()
            .any(|claim| claim.transaction_reference == reference)
    }

    /// Records a failed command
    pub fn fail(&mut self, error: TicketingError) {
        tracing::debug!(code = error.code(), error = %error, "Command rejected");
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_formats_with_thousands_separator() {
        assert_eq!(Money::new(450).to_string(), "K450");
        assert_eq!(Money::new(4_500).to_string(), "K4,500");
        assert_eq!(Money::new(1_234_567).to_string(), "K1,234,567");
        assert_eq!(Money::ZERO.to_string(), "K0");
    }

    #[test]
    fn money_multiply_detects_overflow() {
        assert_eq!(Money::new(1500).checked_multiply(3), Some(Money::new(4500)));
        assert_eq!(Money::new(u64::MAX).checked_multiply(2), None);
    }

    #[test]
    fn tier_parsing_is_case_insensitive() {
        assert_eq!("VIP".parse::<Tier>(), Ok(Tier::Vip));
        assert_eq!(" gold ".parse::<Tier>(), Ok(Tier::Gold));
        assert_eq!(
            "platinum".parse::<Tier>(),
            Err(TicketingError::InvalidTier {
                value: "platinum".to_string()
            })
        );
    }

    #[test]
    fn payment_methods_know_their_prefix() {
        assert_eq!("mtn".parse::<PaymentMethod>(), Ok(PaymentMethod::Mtn));
        assert_eq!(PaymentMethod::Airtel.reference_prefix(), "AIR");
        assert!(PaymentMethod::Zamtel.is_mobile());
        assert!(!PaymentMethod::Bank.is_mobile());
        assert!(matches!(
            "paypal".parse::<PaymentMethod>(),
            Err(TicketingError::InvalidMethod { .. })
        ));
    }

    #[test]
    fn booking_reference_is_zero_padded() {
        let booking = Booking {
            id: BookingId::new(),
            number: 42,
            customer: Customer::new(UserId::new(), "chanda", None),
            event_id: EventId::new(),
            tier: Tier::Gold,
            quantity: 2,
            unit_price: Money::new(850),
            total_price: Money::new(1700),
            booked_at: Utc::now(),
            claim_id: None,
        };
        assert_eq!(booking.reference(), "#000042");
    }

    #[test]
    fn new_state_starts_numbering_at_one() {
        let state = TicketingState::new();
        assert_eq!(state.next_booking_number, 1);
        assert!(state.last_error.is_none());
    }
}
