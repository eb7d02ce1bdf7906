//! # Momenta Core
//!
//! Reducer architecture shared by the Momenta ticketing crates.
//!
//! Business rules live in reducers: pure functions from `(State, Action, Environment)`
//! to a mutated state plus a list of [`Effect`](effect::Effect) descriptions. A store
//! executes those effects after the mutation is committed, which keeps side effects
//! such as email notification out of the critical section that guards seat counts.
//!
//! ## Example
//!
//! ```ignore
//! use momenta_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for ConfirmationReducer {
//!     type State = TicketingState;
//!     type Action = ConfirmationAction;
//!     type Environment = TicketingEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut TicketingState,
//!         action: ConfirmationAction,
//!         env: &TicketingEnvironment,
//!     ) -> SmallVec<[Effect<ConfirmationAction>; 4]> {
//!         // validate, mutate, describe follow-up work
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Reducer module - the trait every aggregate implements.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Business logic as a state transition.
    ///
    /// A reducer validates the action against the current state, mutates the state in
    /// place when the action is legal, and returns the effects that should run once
    /// the mutation is visible to other callers.
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: Commands and events the reducer accepts
    /// - `Environment`: Injected dependencies (clock, price table, outbox)
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Describes work to perform after a reducer has committed its state change.
    ///
    /// Effects are values. Nothing runs until a store executes them.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation.
        ///
        /// If the future yields `Some(action)`, the action is fed back to the reducer.
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap a future that produces no follow-up action.
        pub fn fire_and_forget<F>(future: F) -> Effect<Action>
        where
            Action: 'static,
            F: Future<Output = ()> + Send + 'static,
        {
            Effect::Future(Box::pin(async move {
                future.await;
                None
            }))
        }

        /// Lift an effect over a child action type into its parent action type.
        ///
        /// Used when a parent reducer delegates to a child reducer and wraps the
        /// child's actions in one of its own variants.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            Action: Send + 'static,
            B: Send + 'static,
            F: FnOnce(Action) -> B + Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Future(fut) => Effect::Future(Box::pin(async move { fut.await.map(f) })),
            }
        }

        /// Returns `true` for `Effect::None`.
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - dependency injection traits.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Abstracts the current time so audit timestamps are deterministic in tests.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock used in production.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[test]
    fn fire_and_forget_yields_no_action() {
        let effect: Effect<u8> = Effect::fire_and_forget(async {});
        let Effect::Future(fut) = effect else {
            unreachable!("fire_and_forget always builds a future effect");
        };
        assert_eq!(tokio_test::block_on(fut), None);
    }

    #[test]
    fn map_lifts_future_output() {
        let effect: Effect<u8> = Effect::Future(Box::pin(async { Some(2) }));
        let Effect::Future(fut) = effect.map(|n| u32::from(n) * 10) else {
            unreachable!("map preserves the variant");
        };
        assert_eq!(tokio_test::block_on(fut), Some(20));
    }

    #[test]
    fn debug_hides_future_body() {
        let effect: Effect<u8> = Effect::fire_and_forget(async {});
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
        assert!(Effect::<u8>::None.is_none());
    }
}
