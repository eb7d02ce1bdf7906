//! Router configuration.

use super::health::{health_check, metrics};
use super::state::AppState;
use crate::api::{bookings, categories, events, payments};
use axum::{
    routing::{get, post},
    Router,
};

/// Build the complete Axum router.
///
/// `/health` and `/metrics` are open; everything under `/api` expects gateway identity headers
/// where the handler asks for them.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Categories
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/categories/:slug/events", get(categories::category_events))
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/sales", get(events::get_sales))
        .route("/events/:id/bookings", post(bookings::create_booking))
        // Bookings
        .route("/bookings", get(bookings::list_my_bookings))
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/claim", post(bookings::submit_claim))
        // Payments
        .route("/payment-methods/:method", get(payments::payment_instructions))
        .route("/claims", get(payments::list_claims))
        .route("/claims/:id", get(payments::get_claim))
        .route("/claims/:id/approve", post(payments::approve_claim))
        .route("/claims/:id/reject", post(payments::reject_claim))
        .route("/claims/:id/refund", post(payments::refund_claim))
        .route("/claim-batches/approve", post(payments::approve_batch))
        .route("/claim-batches/reject", post(payments::reject_batch));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .nest("/api", api_routes)
        .with_state(state)
}
