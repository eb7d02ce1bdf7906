//! Momenta - event ticketing with admin-verified payment claims.
//!
//! Customers book seats in one of three tiers and then declare how they paid
//! (MTN, Airtel or Zamtel mobile money, or a bank transfer). An administrator
//! checks the money arrived and approves or rejects the claim. Seats leave the
//! inventory only on approval, and return to it on refund.
//!
//! # Architecture
//!
//! ```text
//!   HTTP (axum)            TicketingService
//!  ┌────────────┐        ┌──────────────────┐
//!  │ api::*     │──────▶ │ parse + dispatch │
//!  └────────────┘        └────────┬─────────┘
//!                                 ▼
//!                        ┌──────────────────┐     ┌───────────────────┐
//!                        │ TicketingStore   │────▶│ NotificationOutbox│
//!                        │ (RwLock + reduce)│     └─────────┬─────────┘
//!                        └───┬──────────┬───┘               ▼
//!                            ▼          ▼         ┌───────────────────┐
//!                      reducers   Persistence     │ NotificationWorker│
//!                                 (PostgreSQL)    └───────────────────┘
//! ```
//!
//! # Claim lifecycle
//!
//! ```text
//! pending ──approve──▶ completed ──refund──▶ refunded
//!    │
//!    └────reject────▶ failed
//! ```
//!
//! Every transition happens under the store's write lock, so two approvals of the
//! same claim cannot both consume seats. A transition is persisted before the lock is
//! released and rolled back if the write fails. Notifications are enqueued after the
//! state change commits; a delivery failure never rolls it back.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregates;
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notification;
pub mod persistence;
pub mod pricing;
pub mod server;
pub mod store;
pub mod types;

pub use aggregates::{
    AuditNote, BookingAction, CatalogAction, ClaimStatus, ConfirmationAction, ConsumePolicy,
    NewEvent, PaymentClaim, SequentialReferences, TicketingAction, TicketingEnvironment,
    TicketingReducer,
};
pub use app::{
    BookingView, BulkOutcome, CategorySummary, PaymentInstructions, SalesSummary, TicketingService,
};
pub use config::Config;
pub use error::{Result, TicketingError};
pub use persistence::{InMemoryPersistence, Persistence, PostgresPersistence};
pub use pricing::PriceTable;
pub use store::TicketingStore;
pub use types::*;
