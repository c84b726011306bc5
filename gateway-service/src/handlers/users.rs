use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{users::UpdateUserRequest, DenialResponse, ErrorResponse},
    middleware::AuthSession,
    models::{UserResponse, UserUpdate},
    services::GatewayError,
    utils::ValidatedJson,
    AppState,
};

/// Change a user's role, activation or facility assignment
///
/// Takes effect for sessions issued or refreshed afterwards; deactivation also
/// ends the user's current sessions on their next request.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Missing user_management", body = DenialResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users",
    security(("session_cookie" = []), ("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    session: AuthSession,
    Path(user_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, GatewayError> {
    let update = UserUpdate::from(req);
    let user = state
        .directory
        .update(user_id, update)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    tracing::info!(
        user_id = %user.user_id,
        role = %user.role,
        is_active = user.is_active,
        updated_by = %session.0.snapshot.user_id,
        "User updated"
    );
    Ok(Json(user.sanitized()))
}
