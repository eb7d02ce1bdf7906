//! Application layer: the service callers use and the read models it returns.

pub mod queries;
mod services;

pub use queries::{BookingView, PaymentInstructions, SalesSummary, TierSales};
pub use services::{BulkOutcome, CategorySummary, SkippedClaim, TicketingService};
