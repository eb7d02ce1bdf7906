//! Payment claim endpoints.
//!
//! - GET /api/payment-methods/:method - Where to send money
//! - GET /api/claims?status=pending - Claims for review (admin)
//! - GET /api/claims/:id - One claim (admin)
//! - POST /api/claims/:id/approve|reject|refund - Decide a claim (admin)
//! - POST /api/claim-batches/approve|reject - Decide several pending claims (admin)

use super::error::ApiError;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::identity::RequireAdmin;
use crate::aggregates::{ClaimStatus, PaymentClaim};
use crate::app::{BulkOutcome, PaymentInstructions};
use crate::server::state::AppState;
use crate::types::ClaimId;
use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

/// Filter for the claim list.
#[derive(Debug, Deserialize)]
pub struct ClaimsQuery {
    /// `pending`, `completed`, `failed` or `refunded`
    pub status: Option<String>,
}

/// Claims to decide in one request.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    /// Claim IDs
    pub claim_ids: Vec<ClaimId>,
}

/// Payment instructions for a method.
///
/// # Errors
///
/// 422 for an unknown method.
pub async fn payment_instructions(
    State(state): State<AppState>,
    ApiPath(method): ApiPath<String>,
) -> Result<Json<PaymentInstructions>, ApiError> {
    Ok(Json(state.service.payment_instructions(&method)?))
}

/// Claims, newest first, optionally filtered by status.
///
/// # Errors
///
/// 403 for non-administrators, 422 for an unknown status.
pub async fn list_claims(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<ClaimsQuery>,
) -> Result<Json<Vec<PaymentClaim>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ClaimStatus>)
        .transpose()
        .map_err(ApiError::validation)?;
    Ok(Json(state.service.claims(status).await))
}

/// One claim with its audit notes.
///
/// # Errors
///
/// 403 for non-administrators, 404 for an unknown claim.
pub async fn get_claim(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(claim_id): ApiPath<Uuid>,
) -> Result<Json<PaymentClaim>, ApiError> {
    Ok(Json(state.service.claim(ClaimId::from_uuid(claim_id)).await?))
}

/// Approve a pending claim, consuming its seats.
///
/// # Errors
///
/// 403 for non-administrators, 404 for an unknown claim, 409 if the claim is not pending.
pub async fn approve_claim(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(claim_id): ApiPath<Uuid>,
) -> Result<Json<PaymentClaim>, ApiError> {
    let claim = state
        .service
        .approve(ClaimId::from_uuid(claim_id), &admin.actor())
        .await?;
    Ok(Json(claim))
}

/// Reject a pending claim.
///
/// # Errors
///
/// 403 for non-administrators, 404 for an unknown claim, 409 if the claim is not pending.
pub async fn reject_claim(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(claim_id): ApiPath<Uuid>,
) -> Result<Json<PaymentClaim>, ApiError> {
    let claim = state
        .service
        .reject(ClaimId::from_uuid(claim_id), &admin.actor())
        .await?;
    Ok(Json(claim))
}

/// Refund a completed claim, restoring its seats.
///
/// # Errors
///
/// 403 for non-administrators, 404 for an unknown claim, 409 if the claim is not completed.
pub async fn refund_claim(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(claim_id): ApiPath<Uuid>,
) -> Result<Json<PaymentClaim>, ApiError> {
    let claim = state
        .service
        .refund(ClaimId::from_uuid(claim_id), &admin.actor())
        .await?;
    Ok(Json(claim))
}

/// Approve several claims; those not pending are reported as skipped.
///
/// # Errors
///
/// 403 for non-administrators.
pub async fn approve_batch(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<BatchRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    Ok(Json(
        state
            .service
            .approve_all(&request.claim_ids, &admin.actor())
            .await?,
    ))
}

/// Reject several claims; those not pending are reported as skipped.
///
/// # Errors
///
/// 403 for non-administrators.
pub async fn reject_batch(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<BatchRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    Ok(Json(
        state
            .service
            .reject_all(&request.claim_ids, &admin.actor())
            .await?,
    ))
}
