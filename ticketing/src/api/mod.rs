//! JSON API handlers.
//!
//! Callers are identified by gateway headers (see [`identity`]); handlers translate
//! domain errors to HTTP statuses through [`error::ApiError`].

pub mod bookings;
pub mod categories;
pub mod error;
pub mod events;
pub mod extract;
pub mod identity;
pub mod payments;

pub use error::ApiError;
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use identity::{Identity, RequireAdmin};
