//! Inventory ledger: remaining seats per tier for one event.
//!
//! Booking creation only *checks* the counters. They are decremented when an
//! administrator approves a payment claim and incremented when a completed claim is
//! refunded, so the confirmation state machine is the only writer after
//! registration. The mutators are crate-private to keep it that way.
//!
//! Because the check and the decrement happen at different times, several pending
//! claims can each pass the check against the same unconsumed pool. What happens when
//! they are all approved is decided by [`ConsumePolicy`].

use crate::error::TicketingError;
use crate::types::Tier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How `confirm_consume` behaves when fewer seats remain than the booking holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumePolicy {
    /// Decrement floored at zero. The approval goes through and the shortfall is
    /// reported in the outcome (oversell is absorbed, not rejected).
    #[default]
    Clamp,
    /// Conditional decrement: refuse with `InsufficientInventory` and leave the
    /// counter untouched.
    Strict,
}

impl FromStr for ConsumePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(Self::Clamp),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown consume policy: {other}")),
        }
    }
}

impl fmt::Display for ConsumePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clamp => f.write_str("clamp"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

/// Result of consuming seats on approval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsumeOutcome {
    /// Seats actually taken off the counter
    pub consumed: u32,
    /// Seats that could not be taken because the counter hit zero
    pub shortfall: u32,
    /// Counter value afterwards
    pub remaining: u32,
}

impl ConsumeOutcome {
    /// Whether the floor at zero was hit
    #[must_use]
    pub const fn clamped(&self) -> bool {
        self.shortfall > 0
    }
}

/// Remaining seats for the three tiers of one event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EventInventory {
    vip_remaining: u32,
    gold_remaining: u32,
    standard_remaining: u32,
}

impl EventInventory {
    /// Initial inventory at event registration
    #[must_use]
    pub const fn new(vip: u32, gold: u32, standard: u32) -> Self {
        Self {
            vip_remaining: vip,
            gold_remaining: gold,
            standard_remaining: standard,
        }
    }

    /// Seats left in `tier`
    #[must_use]
    pub const fn remaining(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Vip => self.vip_remaining,
            Tier::Gold => self.gold_remaining,
            Tier::Standard => self.standard_remaining,
        }
    }

    /// Seats left across all tiers
    #[must_use]
    pub const fn total_remaining(&self) -> u32 {
        self.vip_remaining
            .saturating_add(self.gold_remaining)
            .saturating_add(self.standard_remaining)
    }

    /// Read-only availability check. Does not reserve anything.
    #[must_use]
    pub const fn reserve_check(&self, tier: Tier, quantity: u32) -> bool {
        quantity <= self.remaining(tier)
    }

    /// Take `quantity` seats off `tier` on claim approval.
    ///
    /// Callers must invoke this once per approval; there is no deduplication here.
    ///
    /// # Errors
    ///
    /// Under [`ConsumePolicy::Strict`], returns `InsufficientInventory` when fewer
    /// than `quantity` seats remain. [`ConsumePolicy::Clamp`] never fails.
    pub(crate) fn confirm_consume(
        &mut self,
        tier: Tier,
        quantity: u32,
        policy: ConsumePolicy,
    ) -> Result<ConsumeOutcome, TicketingError> {
        let slot = self.slot_mut(tier);
        let available = *slot;

        if policy == ConsumePolicy::Strict && available < quantity {
            return Err(TicketingError::InsufficientInventory {
                tier,
                requested: quantity,
                available,
            });
        }

        let consumed = quantity.min(available);
        *slot = available - consumed;

        Ok(ConsumeOutcome {
            consumed,
            shortfall: quantity - consumed,
            remaining: *slot,
        })
    }

    /// Put `quantity` seats back on `tier` after a refund. Not capped at the
    /// registered capacity. Returns the new counter value.
    pub(crate) fn reverse_restore(&mut self, tier: Tier, quantity: u32) -> u32 {
        let slot = self.slot_mut(tier);
        *slot = slot.saturating_add(quantity);
        *slot
    }

    fn slot_mut(&mut self, tier: Tier) -> &mut u32 {
        match tier {
            Tier::Vip => &mut self.vip_remaining,
            Tier::Gold => &mut self.gold_remaining,
            Tier::Standard => &mut self.standard_remaining,
        }
    }
}
