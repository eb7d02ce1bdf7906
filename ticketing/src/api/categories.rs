//! Category endpoints.

use super::error::ApiError;
use super::events::EventResponse;
use super::extract::{ApiJson, ApiPath};
use super::identity::RequireAdmin;
use crate::app::CategorySummary;
use crate::server::state::AppState;
use crate::types::Category;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/categories`.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Display name; the slug is derived from it
    pub name: String,
}

/// A category with its events, latest first.
#[derive(Debug, Serialize)]
pub struct CategoryEventsResponse {
    /// The category
    pub category: Category,
    /// Its events
    pub events: Vec<EventResponse>,
}

/// List categories with their event counts.
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    Json(state.service.categories().await)
}

/// Register a category.
///
/// # Errors
///
/// 403 for non-administrators, 422 for a blank or duplicate name.
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.service.register_category(&request.name).await?;
    tracing::info!(slug = %category.slug, admin = %admin.username, "Category registered via API");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Events in one category.
///
/// # Errors
///
/// 404 for an unknown slug.
pub async fn category_events(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<CategoryEventsResponse>, ApiError> {
    let (category, events) = state.service.category_events(&slug).await?;
    Ok(Json(CategoryEventsResponse {
        category,
        events: events
            .into_iter()
            .map(|event| EventResponse::new(event, &state))
            .collect(),
    }))
}
