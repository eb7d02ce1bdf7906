//! Confirmation state machine for payment claims.
//!
//! ```text
//!            approve            refund
//! pending ──────────▶ completed ───────▶ refunded
//!    │
//!    └──────────────▶ failed
//!            reject
//! ```
//!
//! This module is the only writer of a claim's status. Approval is the single point
//! where seats are taken off the inventory and refund the single point where they are
//! put back. Every transition appends audit notes and queues a customer notification
//! that is delivered after the change is committed.

use crate::aggregates::environment::TicketingEnvironment;
use crate::error::TicketingError;
use crate::notification::{Notification, NotificationKind};
use crate::types::{Actor, BookingId, ClaimId, Money, PaymentMethod, TicketingState};
use chrono::{DateTime, Utc};
use momenta_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Status
// ============================================================================

/// Lifecycle of a payment claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    /// Submitted, waiting for an administrator
    Pending,
    /// Approved; seats consumed
    Completed,
    /// Rejected; seats never consumed
    Failed,
    /// Completed claim refunded; seats restored
    Refunded,
}

impl ClaimStatus {
    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Whether `self → to` is an edge of the state machine
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Completed | Self::Failed) | (Self::Completed, Self::Refunded)
        )
    }

    /// Validates `self → to`.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` for anything but `pending → completed`,
    /// `pending → failed` and `completed → refunded`.
    pub fn transition(self, to: Self) -> Result<Self, TicketingError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TicketingError::IllegalTransition { from: self, to })
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

// ============================================================================
// Claim
// ============================================================================

/// One line of a claim's audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditNote {
    /// When it was written
    pub at: DateTime<Utc>,
    /// Who caused it
    pub actor: String,
    /// What happened
    pub message: String,
}

/// A customer's declaration of having paid for a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentClaim {
    /// Claim ID
    pub id: ClaimId,
    /// Booking paid for (one claim per booking)
    pub booking_id: BookingId,
    /// Declared payment method
    pub method: PaymentMethod,
    /// Booking total at submission time
    pub amount: Money,
    status: ClaimStatus,
    /// 10-digit number the money was sent from (mobile methods only)
    pub contact: Option<String>,
    /// Proof-of-payment reference (bank only)
    pub proof_reference: Option<String>,
    /// External identifier, method prefix plus 10 digits
    pub transaction_reference: String,
    notes: Vec<AuditNote>,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Last transition time
    pub updated_at: DateTime<Utc>,
}

/// Fields of a new claim, assembled by the booking reducer.
#[derive(Clone, Debug)]
pub(crate) struct ClaimSubmission {
    pub id: ClaimId,
    pub booking_id: BookingId,
    pub method: PaymentMethod,
    pub amount: Money,
    pub contact: Option<String>,
    pub proof_reference: Option<String>,
    pub transaction_reference: String,
}

impl PaymentClaim {
    /// A new claim in `pending`, with its opening audit notes.
    pub(crate) fn submitted(
        submission: ClaimSubmission,
        actor: &str,
        notes: impl IntoIterator<Item = String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: submission.id,
            booking_id: submission.booking_id,
            method: submission.method,
            amount: submission.amount,
            status: ClaimStatus::Pending,
            contact: submission.contact,
            proof_reference: submission.proof_reference,
            transaction_reference: submission.transaction_reference,
            notes: notes
                .into_iter()
                .map(|message| AuditNote {
                    at: now,
                    actor: actor.to_string(),
                    message,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// A claim read back from storage, status and trail as they were written.
    pub(crate) fn restored(
        submission: ClaimSubmission,
        status: ClaimStatus,
        notes: Vec<AuditNote>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: submission.id,
            booking_id: submission.booking_id,
            method: submission.method,
            amount: submission.amount,
            status,
            contact: submission.contact,
            proof_reference: submission.proof_reference,
            transaction_reference: submission.transaction_reference,
            notes,
            created_at,
            updated_at,
        }
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> ClaimStatus {
        self.status
    }

    /// Audit trail, oldest first
    #[must_use]
    pub fn notes(&self) -> &[AuditNote] {
        &self.notes
    }

    fn apply(&mut self, to: ClaimStatus, actor: &str, messages: Vec<String>, now: DateTime<Utc>) {
        self.status = to;
        self.updated_at = now;
        self.notes.extend(messages.into_iter().map(|message| AuditNote {
            at: now,
            actor: actor.to_string(),
            message,
        }));
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Administrative decisions on a claim
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmationAction {
    /// `pending → completed`; consumes seats
    Approve {
        /// Claim to approve
        claim_id: ClaimId,
        /// Administrator
        actor: Actor,
    },
    /// `pending → failed`
    Reject {
        /// Claim to reject
        claim_id: ClaimId,
        /// Administrator
        actor: Actor,
    },
    /// `completed → refunded`; restores seats
    Refund {
        /// Claim to refund
        claim_id: ClaimId,
        /// Administrator
        actor: Actor,
    },
}

impl ConfirmationAction {
    /// Claim the decision applies to
    #[must_use]
    pub const fn claim_id(&self) -> ClaimId {
        match self {
            Self::Approve { claim_id, .. }
            | Self::Reject { claim_id, .. }
            | Self::Refund { claim_id, .. } => *claim_id,
        }
    }

    const fn target(&self) -> ClaimStatus {
        match self {
            Self::Approve { .. } => ClaimStatus::Completed,
            Self::Reject { .. } => ClaimStatus::Failed,
            Self::Refund { .. } => ClaimStatus::Refunded,
        }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for claim transitions
#[derive(Clone, Debug, Default)]
pub struct ConfirmationReducer;

impl ConfirmationReducer {
    /// Creates a new `ConfirmationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates, mutates inventory and claim, and returns the notification to queue.
    fn transition(
        state: &mut TicketingState,
        claim_id: ClaimId,
        actor: &Actor,
        to: ClaimStatus,
        env: &TicketingEnvironment,
    ) -> Result<Notification, TicketingError> {
        if !actor.is_admin {
            return Err(TicketingError::Forbidden {
                actor: actor.username.clone(),
            });
        }

        let claim = state
            .claims
            .get(&claim_id)
            .ok_or(TicketingError::ClaimNotFound(claim_id))?;
        let from = claim.status;
        from.transition(to)?;

        let booking = state
            .bookings
            .get(&claim.booking_id)
            .cloned()
            .ok_or(TicketingError::BookingNotFound(claim.booking_id))?;
        let event = state
            .events
            .get_mut(&booking.event_id)
            .ok_or(TicketingError::EventNotFound(booking.event_id))?;

        let now = env.clock.now();
        let stamp = now.format("%Y-%m-%d %H:%M:%S");
        let (tier, quantity) = (booking.tier, booking.quantity);

        let (kind, messages) = match to {
            ClaimStatus::Completed => {
                let outcome = event.inventory.confirm_consume(tier, quantity, env.consume_policy)?;
                let mut messages = vec![
                    format!("Approved by admin: {} on {stamp}", actor.username),
                    format!("Seats reserved: {quantity} x {}", tier.label()),
                ];
                if outcome.clamped() {
                    tracing::warn!(
                        claim_id = %claim_id,
                        event_id = %booking.event_id,
                        tier = tier.as_str(),
                        requested = quantity,
                        consumed = outcome.consumed,
                        shortfall = outcome.shortfall,
                        "Approval oversold tier; remaining seats clamped at zero"
                    );
                    metrics::counter!("momenta_oversell_clamped_total")
                        .increment(u64::from(outcome.shortfall));
                    messages.push(format!(
                        "Oversold: only {} {} seat(s) were left; {} approved beyond capacity",
                        outcome.consumed,
                        tier.label(),
                        outcome.shortfall
                    ));
                }
                metrics::counter!("momenta_tickets_confirmed_total").increment(u64::from(quantity));
                (NotificationKind::ClaimApproved, messages)
            },
            ClaimStatus::Failed => (
                NotificationKind::ClaimRejected,
                vec![format!("Rejected by admin: {} on {stamp}", actor.username)],
            ),
            ClaimStatus::Refunded => {
                event.inventory.reverse_restore(tier, quantity);
                (
                    NotificationKind::ClaimRefunded,
                    vec![
                        format!("Refunded by admin: {} on {stamp}", actor.username),
                        format!("Payment refunded. Seats restored: {quantity} x {}", tier.label()),
                    ],
                )
            },
            ClaimStatus::Pending => return Err(TicketingError::IllegalTransition { from, to }),
        };

        metrics::gauge!(
            "momenta_seats_remaining",
            "event" => booking.event_id.to_string(),
            "tier" => tier.as_str()
        )
        .set(f64::from(event.inventory.remaining(tier)));
        let event = event.clone();

        let claim = state
            .claims
            .get_mut(&claim_id)
            .ok_or(TicketingError::ClaimNotFound(claim_id))?;
        claim.apply(to, &actor.username, messages, now);
        metrics::counter!("momenta_claims_total", "status" => to.as_str()).increment(1);

        tracing::info!(
            claim_id = %claim_id,
            transaction = %claim.transaction_reference,
            booking = %booking.reference(),
            from = %from,
            to = %to,
            actor = %actor.username,
            remaining = event.inventory.remaining(tier),
            "Payment claim transitioned"
        );

        Ok(Notification::for_claim(kind, &booking, &event, claim))
    }
}

impl Reducer for ConfirmationReducer {
    type State = TicketingState;
    type Action = ConfirmationAction;
    type Environment = TicketingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let to = action.target();
        let (ConfirmationAction::Approve { claim_id, actor }
        | ConfirmationAction::Reject { claim_id, actor }
        | ConfirmationAction::Refund { claim_id, actor }) = action;

        match Self::transition(state, claim_id, &actor, to, env) {
            Ok(notification) => smallvec![env.notify(notification)],
            Err(error) => {
                state.fail(error);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::aggregates::test_support::{pending_claim_state, test_env};
    use crate::types::Tier;
    use momenta_testing::{assertions, ReducerTest};

    #[test]
    fn status_edges() {
        use ClaimStatus::{Completed, Failed, Pending, Refunded};
        assert_eq!(Pending.transition(Completed), Ok(Completed));
        assert_eq!(Pending.transition(Failed), Ok(Failed));
        assert_eq!(Completed.transition(Refunded), Ok(Refunded));
        for (from, to) in [
            (Completed, Completed),
            (Failed, Completed),
            (Refunded, Completed),
            (Pending, Refunded),
            (Failed, Refunded),
            (Completed, Failed),
            (Refunded, Pending),
        ] {
            assert_eq!(
                from.transition(to),
                Err(TicketingError::IllegalTransition { from, to })
            );
        }
    }

    #[test]
    fn status_parses_query_values() {
        assert_eq!("Pending".parse::<ClaimStatus>(), Ok(ClaimStatus::Pending));
        assert!("approved".parse::<ClaimStatus>().is_err());
        assert_eq!(ClaimStatus::Refunded.to_string(), "refunded");
    }

    #[test]
    fn approve_consumes_seats_and_notes_actor() {
        let (state, claim_id, event_id) = pending_claim_state(5, Tier::Vip, 3);

        ReducerTest::new(ConfirmationReducer::new())
            .with_env(test_env().0)
            .given_state(state)
            .when_action(ConfirmationAction::Approve {
                claim_id,
                actor: Actor::admin("nalisa"),
            })
            .then_state(move |state| {
                assert!(state.last_error.is_none());
                let claim = state.claim(&claim_id).unwrap();
                assert_eq!(claim.status(), ClaimStatus::Completed);
                let messages: Vec<_> = claim.notes().iter().map(|n| n.message.as_str()).collect();
                assert!(messages.contains(&"Approved by admin: nalisa on 2025-01-01 00:00:00"));
                assert!(messages.contains(&"Seats reserved: 3 x VIP"));
                assert_eq!(state.event(&event_id).unwrap().inventory.remaining(Tier::Vip), 2);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn second_approve_is_illegal_and_consumes_nothing() {
        let (state, claim_id, event_id) = pending_claim_state(5, Tier::Vip, 3);
        let approve = ConfirmationAction::Approve {
            claim_id,
            actor: Actor::admin("nalisa"),
        };

        ReducerTest::new(ConfirmationReducer::new())
            .with_env(test_env().0)
            .given_state(state)
            .given_actions([approve.clone()])
            .when_action(approve)
            .then_state(move |state| {
                assert_eq!(
                    state.last_error,
                    Some(TicketingError::IllegalTransition {
                        from: ClaimStatus::Completed,
                        to: ClaimStatus::Completed,
                    })
                );
                assert_eq!(state.event(&event_id).unwrap().inventory.remaining(Tier::Vip), 2);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn reject_leaves_inventory_alone() {
        let (state, claim_id, event_id) = pending_claim_state(5, Tier::Gold, 2);

        ReducerTest::new(ConfirmationReducer::new())
            .with_env(test_env().0)
            .given_state(state)
            .when_action(ConfirmationAction::Reject {
                claim_id,
                actor: Actor::admin("nalisa"),
            })
            .then_state(move |state| {
                let claim = state.claim(&claim_id).unwrap();
                assert_eq!(claim.status(), ClaimStatus::Failed);
                assert_eq!(
                    claim.notes().last().unwrap().message,
                    "Rejected by admin: nalisa on 2025-01-01 00:00:00"
                );
                assert_eq!(state.event(&event_id).unwrap().inventory.remaining(Tier::Gold), 5);
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn refund_restores_what_approve_took() {
        let (state, claim_id, event_id) = pending_claim_state(5, Tier::Standard, 4);
        let admin = Actor::admin("nalisa");

        ReducerTest::new(ConfirmationReducer::new())
            .with_env(test_env().0)
            .given_state(state)
            .given_actions([ConfirmationAction::Approve {
                claim_id,
                actor: admin.clone(),
            }])
            .when_action(ConfirmationAction::Refund {
                claim_id,
                actor: admin,
            })
            .then_state(move |state| {
                let claim = state.claim(&claim_id).unwrap();
                assert_eq!(claim.status(), ClaimStatus::Refunded);
                assert_eq!(
                    claim.notes().last().unwrap().message,
                    "Payment refunded. Seats restored: 4 x Standard"
                );
                assert_eq!(
                    state.event(&event_id).unwrap().inventory.remaining(Tier::Standard),
                    5
                );
            })
            .run();
    }

    #[test]
    fn refund_of_pending_claim_is_illegal() {
        let (state, claim_id, _) = pending_claim_state(5, Tier::Vip, 1);

        ReducerTest::new(ConfirmationReducer::new())
            .with_env(test_env().0)
            .given_state(state)
            .when_action(ConfirmationAction::Refund {
                claim_id,
                actor: Actor::admin("nalisa"),
            })
            .then_state(move |state| {
                assert_eq!(state.claim(&claim_id).unwrap().status(), ClaimStatus::Pending);
                assert_eq!(
                    state.last_error,
                    Some(TicketingError::IllegalTransition {
                        from: ClaimStatus::Pending,
                        to: ClaimStatus::Refunded,
                    })
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn non_admin_is_forbidden_before_status_check() {
        let (state, claim_id, _) = pending_claim_state(5, Tier::Vip, 1);

        ReducerTest::new(ConfirmationReducer::new())
            .with_env(test_env().0)
            .given_state(state)
            .when_action(ConfirmationAction::Refund {
                claim_id,
                actor: Actor::user(crate::types::UserId::new(), "mwila"),
            })
            .then_state(move |state| {
                assert_eq!(
                    state.last_error,
                    Some(TicketingError::Forbidden {
                        actor: "mwila".to_string()
                    })
                );
                assert_eq!(state.claim(&claim_id).unwrap().status(), ClaimStatus::Pending);
            })
            .run();
    }

    #[test]
    fn strict_policy_refuses_oversold_approval() {
        let (mut state, claim_id, event_id) = pending_claim_state(5, Tier::Vip, 3);
        state
            .events
            .get_mut(&event_id)
            .unwrap()
            .inventory
            .confirm_consume(Tier::Vip, 4, crate::aggregates::inventory::ConsumePolicy::Clamp)
            .unwrap();

        ReducerTest::new(ConfirmationReducer::new())
            .with_env(
                test_env()
                    .0
                    .with_consume_policy(crate::aggregates::inventory::ConsumePolicy::Strict),
            )
            .given_state(state)
            .when_action(ConfirmationAction::Approve {
                claim_id,
                actor: Actor::admin("nalisa"),
            })
            .then_state(move |state| {
                assert_eq!(state.claim(&claim_id).unwrap().status(), ClaimStatus::Pending);
                assert_eq!(state.event(&event_id).unwrap().inventory.remaining(Tier::Vip), 1);
                assert!(matches!(
                    state.last_error,
                    Some(TicketingError::InsufficientInventory { available: 1, .. })
                ));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn clamped_approval_is_noted() {
        let (mut state, claim_id, event_id) = pending_claim_state(5, Tier::Vip, 3);
        state
            .events
            .get_mut(&event_id)
            .unwrap()
            .inventory
            .confirm_consume(Tier::Vip, 4, crate::aggregates::inventory::ConsumePolicy::Clamp)
            .unwrap();

        ReducerTest::new(ConfirmationReducer::new())
            .with_env(test_env().0)
            .given_state(state)
            .when_action(ConfirmationAction::Approve {
                claim_id,
                actor: Actor::admin("nalisa"),
            })
            .then_state(move |state| {
                let claim = state.claim(&claim_id).unwrap();
                assert_eq!(claim.status(), ClaimStatus::Completed);
                assert!(claim.notes().last().unwrap().message.starts_with("Oversold"));
                assert_eq!(state.event(&event_id).unwrap().inventory.remaining(Tier::Vip), 0);
            })
            .run();
    }
}
