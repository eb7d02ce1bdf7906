//! Dependencies injected into the ticketing reducers.

use crate::aggregates::inventory::ConsumePolicy;
use crate::config::BookingConfig;
use crate::notification::{Notification, NotificationOutbox};
use crate::pricing::PriceTable;
use crate::types::PaymentMethod;
use momenta_core::effect::Effect;
use momenta_core::environment::Clock;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Produces the digit part of transaction references.
pub trait ReferenceGenerator: Send + Sync {
    /// A candidate reference for `method`: 3-letter prefix plus 10 digits.
    fn generate(&self, method: PaymentMethod) -> String;
}

/// Random 10-digit suffix. Production generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomReferences;

impl ReferenceGenerator for RandomReferences {
    fn generate(&self, method: PaymentMethod) -> String {
        let digits: u64 = rand::thread_rng().gen_range(0..10_000_000_000);
        format!("{}{digits:010}", method.reference_prefix())
    }
}

/// Counts up from a starting value. Deterministic references for tests and the demo.
#[derive(Debug, Default)]
pub struct SequentialReferences {
    next: AtomicU64,
}

impl SequentialReferences {
    /// Starts counting at `first`
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl ReferenceGenerator for SequentialReferences {
    fn generate(&self, method: PaymentMethod) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) % 10_000_000_000;
        format!("{}{n:010}", method.reference_prefix())
    }
}

/// Environment shared by the catalog, booking and confirmation reducers.
#[derive(Clone)]
pub struct TicketingEnvironment {
    /// Clock for booking and audit timestamps
    pub clock: Arc<dyn Clock>,
    /// Price per seat, copied into bookings at creation
    pub prices: PriceTable,
    /// Upper bound on seats per booking
    pub max_quantity: u32,
    /// Behaviour of approvals on an exhausted tier
    pub consume_policy: ConsumePolicy,
    /// Transaction reference source
    pub references: Arc<dyn ReferenceGenerator>,
    /// Where committed transitions queue customer notifications
    pub outbox: Arc<dyn NotificationOutbox>,
}

impl TicketingEnvironment {
    /// Default prices, a cap of 10 seats, clamping approvals and random references.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, outbox: Arc<dyn NotificationOutbox>) -> Self {
        Self {
            clock,
            prices: PriceTable::default(),
            max_quantity: 10,
            consume_policy: ConsumePolicy::default(),
            references: Arc::new(RandomReferences),
            outbox,
        }
    }

    /// Environment with the booking rules from configuration
    #[must_use]
    pub fn from_config(
        config: &BookingConfig,
        clock: Arc<dyn Clock>,
        outbox: Arc<dyn NotificationOutbox>,
    ) -> Self {
        Self::new(clock, outbox)
            .with_prices(config.prices)
            .with_max_quantity(config.max_tickets_per_booking)
            .with_consume_policy(config.consume_policy)
    }

    /// Replace the price table
    #[must_use]
    pub const fn with_prices(mut self, prices: PriceTable) -> Self {
        self.prices = prices;
        self
    }

    /// Replace the quantity cap
    #[must_use]
    pub const fn with_max_quantity(mut self, max_quantity: u32) -> Self {
        self.max_quantity = max_quantity;
        self
    }

    /// Replace the consume policy
    #[must_use]
    pub const fn with_consume_policy(mut self, policy: ConsumePolicy) -> Self {
        self.consume_policy = policy;
        self
    }

    /// Replace the reference generator
    #[must_use]
    pub fn with_references(mut self, references: Arc<dyn ReferenceGenerator>) -> Self {
        self.references = references;
        self
    }

    /// Effect that queues `notification` once the store runs it.
    pub(crate) fn notify<A: 'static>(&self, notification: Notification) -> Effect<A> {
        let outbox = Arc::clone(&self.outbox);
        Effect::fire_and_forget(async move { outbox.enqueue(notification) })
    }
}

impl std::fmt::Debug for TicketingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketingEnvironment")
            .field("prices", &self.prices)
            .field("max_quantity", &self.max_quantity)
            .field("consume_policy", &self.consume_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_references_have_prefix_and_ten_digits() {
        let reference = RandomReferences.generate(PaymentMethod::Zamtel);
        assert_eq!(reference.len(), 13);
        assert!(reference.starts_with("ZAM"));
        assert!(reference[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn sequential_references_count_up() {
        let references = SequentialReferences::starting_at(41);
        assert_eq!(references.generate(PaymentMethod::Mtn), "MTN0000000041");
        assert_eq!(references.generate(PaymentMethod::Bank), "BAN0000000042");
    }
}
