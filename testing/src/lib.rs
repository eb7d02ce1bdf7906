//! # Momenta Testing
//!
//! Test helpers for reducers built on `momenta-core`.
//!
//! - [`FixedClock`] and [`test_clock`] for deterministic audit timestamps
//! - [`ReducerTest`] for Given-When-Then reducer tests
//! - [`assertions`] for common checks on returned effects
//!
//! ```ignore
//! use momenta_testing::{assertions, ReducerTest};
//!
//! ReducerTest::new(ConfirmationReducer::new())
//!     .with_env(test_env())
//!     .given_state(state_with_pending_claim())
//!     .when_action(ConfirmationAction::Approve { claim_id, actor })
//!     .then_state(|state| assert_eq!(state.last_error, None))
//!     .then_effects(|effects| assertions::assert_effects_count(effects, 1))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use momenta_core::environment::Clock;


/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Clock that always reports the same instant.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Default fixed clock for tests (2025-01-01 00:00:00 UTC).
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(1_735_689_600))
    }
}

pub use mocks::{test_clock, FixedClock};
pub use reducer_test::{assertions, ReducerTest};
