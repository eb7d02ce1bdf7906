//! Booking endpoints.
//!
//! - POST /api/events/:id/bookings - Book seats at the current price
//! - GET /api/bookings - The caller's bookings with payment status
//! - GET /api/bookings/:id - One booking (owner or admin)
//! - POST /api/bookings/:id/claim - Declare payment for a booking (owner or admin)

use super::error::ApiError;
use super::extract::{ApiJson, ApiPath};
use super::identity::Identity;
use crate::aggregates::PaymentClaim;
use crate::app::BookingView;
use crate::server::state::AppState;
use crate::types::{Booking, BookingId, EventId, Money};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to book seats.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// `vip`, `gold` or `standard`
    pub tier: String,
    /// Number of seats
    pub quantity: u32,
}

/// Booking with its human-facing reference.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    /// The booking
    #[serde(flatten)]
    pub booking: Booking,
    /// `#000042`
    pub reference: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        let reference = booking.reference();
        Self { booking, reference }
    }
}

/// Request to declare payment.
#[derive(Debug, Deserialize)]
pub struct SubmitClaimRequest {
    /// `mtn`, `airtel`, `zamtel` or `bank`
    pub method: String,
    /// Amount the customer says they paid; the booking total always wins
    pub amount: Option<u64>,
    /// 10-digit number paid from (mobile methods)
    pub contact: Option<String>,
    /// Proof-of-payment reference (bank)
    pub proof: Option<String>,
}

/// Book seats for an event.
///
/// # Errors
///
/// 401 without identity, 404 for an unknown event, 422 for a bad tier or quantity,
/// 409 when the tier has too few seats left.
pub async fn create_booking(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let booking = state
        .service
        .create_booking(
            identity.customer(),
            EventId::from_uuid(event_id),
            &request.tier,
            request.quantity,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// The caller's bookings, newest first.
pub async fn list_my_bookings(
    State(state): State<AppState>,
    identity: Identity,
) -> Json<Vec<BookingView>> {
    Json(state.service.bookings_for(identity.id).await)
}

/// One booking.
///
/// # Errors
///
/// 404 for an unknown booking, 403 if the caller neither owns it nor is an admin.
pub async fn get_booking(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(booking_id): ApiPath<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = owned_booking(&state, &identity, BookingId::from_uuid(booking_id)).await?;
    Ok(Json(booking.into()))
}

/// Declare payment for a booking. The claim starts `pending`.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/bookings/<id>/claim \
///   -H "x-user-id: 6f1c..." -H "x-user-name: mwila" \
///   -H "Content-Type: application/json" \
///   -d '{"method":"airtel","contact":"0977123456"}'
/// ```
///
/// # Errors
///
/// 404 for an unknown booking, 403 for someone else's booking, 422 for a bad method
/// or missing contact, 409 if the booking already has a claim.
pub async fn submit_claim(
    State(state): State<AppState>,
    identity: Identity,
    ApiPath(booking_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SubmitClaimRequest>,
) -> Result<(StatusCode, Json<PaymentClaim>), ApiError> {
    let booking = owned_booking(&state, &identity, BookingId::from_uuid(booking_id)).await?;
    let claim = state
        .service
        .submit_claim(
            booking.id,
            &request.method,
            request.amount.map(Money::new),
            request.contact,
            request.proof,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

async fn owned_booking(
    state: &AppState,
    identity: &Identity,
    booking_id: BookingId,
) -> Result<Booking, ApiError> {
    let booking = state.service.booking(booking_id).await?;
    if booking.customer.id != identity.id && !identity.is_admin {
        return Err(ApiError::forbidden(format!(
            "Booking {} belongs to another customer",
            booking.reference()
        )));
    }
    Ok(booking)
}
