//! Tier price table.
//!
//! Injected into the booking reducer through the environment so tests and
//! deployments can use their own prices. Bookings copy the price at creation time.

use crate::types::{Money, Tier};
use serde::{Deserialize, Serialize};

/// Price per seat for each tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    /// VIP seat price
    pub vip: Money,
    /// Gold seat price
    pub gold: Money,
    /// Standard seat price
    pub standard: Money,
}

impl PriceTable {
    /// Creates a price table
    #[must_use]
    pub const fn new(vip: Money, gold: Money, standard: Money) -> Self {
        Self {
            vip,
            gold,
            standard,
        }
    }

    /// Price of one seat in `tier`
    #[must_use]
    pub const fn price(&self, tier: Tier) -> Money {
        match tier {
            Tier::Vip => self.vip,
            Tier::Gold => self.gold,
            Tier::Standard => self.standard,
        }
    }

    /// `quantity * price(tier)`, `None` on overflow
    #[must_use]
    pub const fn total(&self, tier: Tier, quantity: u32) -> Option<Money> {
        self.price(tier).checked_multiply(quantity)
    }
}

impl Default for PriceTable {
    /// K1,500 VIP, K850 Gold, K450 Standard.
    fn default() -> Self {
        Self::new(Money::new(1500), Money::new(850), Money::new(450))
    }
}
