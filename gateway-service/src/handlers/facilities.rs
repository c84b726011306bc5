use axum::{extract::State, http::Method, http::StatusCode, Json};
use service_core::error::AppError;

use crate::{
    dtos::{DenialResponse, ErrorResponse},
    middleware::AuthSession,
    models::{Facility, NewFacility},
    services::{FacilityListing, GatewayError},
    utils::ValidatedJson,
    AppState,
};

/// Facilities visible to the caller
#[utoipa::path(
    get,
    path = "/api/facilities",
    responses(
        (status = 200, description = "Visible facilities with a count annotation", body = FacilityListing),
        (status = 401, description = "No session", body = DenialResponse),
        (status = 403, description = "Account inactive", body = DenialResponse)
    ),
    tag = "Facilities",
    security(("session_cookie" = []), ("bearer_auth" = []))
)]
pub async fn list_facilities(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<FacilityListing>, GatewayError> {
    let listing = state.visibility.list_visible(&session.0.snapshot).await?;
    tracing::debug!(
        role = %session.0.snapshot.role,
        count = listing.user.facility_count,
        "Facility listing"
    );
    Ok(Json(listing))
}

/// Register a facility
#[utoipa::path(
    post,
    path = "/api/facilities",
    request_body = NewFacility,
    responses(
        (status = 201, description = "Facility created", body = Facility),
        (status = 403, description = "Missing manage_all_facilities", body = DenialResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Facilities",
    security(("session_cookie" = []), ("bearer_auth" = []))
)]
pub async fn create_facility(
    State(state): State<AppState>,
    session: AuthSession,
    ValidatedJson(req): ValidatedJson<NewFacility>,
) -> Result<(StatusCode, Json<Facility>), GatewayError> {
    let facility = state
        .facility_store
        .create(req)
        .await
        .map_err(|e| GatewayError::Store(anyhow::Error::new(e)))?;
    tracing::info!(
        facility_id = %facility.id,
        created_by = %session.0.snapshot.user_id,
        "Facility created"
    );
    Ok((StatusCode::CREATED, Json(facility)))
}

/// Any other method on the collection.
pub async fn facilities_method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed {
        method: method.to_string(),
        allowed: vec!["GET", "POST"],
    }
}
