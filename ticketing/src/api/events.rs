//! Event endpoints.
//!
//! - GET /api/events - List events, soonest first
//! - POST /api/events - Register an event (admin)
//! - GET /api/events/:id - Event details with remaining seats and prices
//! - GET /api/events/:id/sales - Sales overview (admin)

use super::error::ApiError;
use super::extract::{ApiJson, ApiPath};
use super::identity::RequireAdmin;
use crate::aggregates::NewEvent;
use crate::app::SalesSummary;
use crate::server::state::AppState;
use crate::types::{Event, EventId, Money, Tier};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

/// Seats and price for one tier.
#[derive(Debug, Serialize)]
pub struct TierAvailability {
    /// Tier
    pub tier: Tier,
    /// Display label
    pub label: &'static str,
    /// Current unit price
    pub price: Money,
    /// Seats left
    pub remaining: u32,
}

/// Event as shown to customers.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event ID
    pub id: EventId,
    /// Category slug
    pub category: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Date
    pub date: NaiveDate,
    /// Start time
    pub time: Option<NaiveTime>,
    /// Venue
    pub location: String,
    /// Organizer
    pub organizer_name: String,
    /// Organizer phone
    pub organizer_phone: String,
    /// Per-tier seats and prices
    pub tiers: Vec<TierAvailability>,
}

impl EventResponse {
    pub(crate) fn new(event: Event, state: &AppState) -> Self {
        let prices = &state.service.store().environment().prices;
        let tiers = Tier::ALL
            .iter()
            .map(|&tier| TierAvailability {
                tier,
                label: tier.label(),
                price: prices.price(tier),
                remaining: event.inventory.remaining(tier),
            })
            .collect();

        Self {
            id: event.id,
            category: event.category,
            title: event.title,
            description: event.description,
            date: event.date,
            time: event.time,
            location: event.location,
            organizer_name: event.organizer_name,
            organizer_phone: event.organizer_phone,
            tiers,
        }
    }
}

/// List events.
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<EventResponse>> {
    let events = state.service.events().await;
    Json(
        events
            .into_iter()
            .map(|event| EventResponse::new(event, &state))
            .collect(),
    )
}

/// Register an event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events \
///   -H "x-user-id: 6f1c..." -H "x-user-name: nalisa" -H "x-user-admin: true" \
///   -H "Content-Type: application/json" \
///   -d '{"category":"music","title":"Lusaka Jazz Night","date":"2025-03-14","location":"Mulungushi",
///        "organizer_name":"Nalisa Events","organizer_phone":"0977000000",
///        "vip_seats":5,"gold_seats":20,"standard_seats":100}'
/// ```
///
/// # Errors
///
/// 403 for non-administrators, 404 for an unknown category, 422 for a blank title.
pub async fn create_event(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<NewEvent>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let event = state.service.register_event(request).await?;
    tracing::info!(event_id = %event.id, admin = %admin.username, "Event registered via API");
    Ok((StatusCode::CREATED, Json(EventResponse::new(event, &state))))
}

/// Get one event.
///
/// # Errors
///
/// 404 for an unknown event.
pub async fn get_event(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state.service.event(EventId::from_uuid(event_id)).await?;
    Ok(Json(EventResponse::new(event, &state)))
}

/// Sales overview for one event.
///
/// # Errors
///
/// 403 for non-administrators, 404 for an unknown event.
pub async fn get_sales(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Json<SalesSummary>, ApiError> {
    let summary = state.service.sales_summary(EventId::from_uuid(event_id)).await?;
    Ok(Json(summary))
}
