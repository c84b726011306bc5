//! Notice pages. Rendering is out of scope; each returns a small JSON body
//! so redirects from the route engine land somewhere.

use axum::{extract::Query, http::StatusCode, Json};
use serde::Deserialize;

use super::auth::safe_callback;
use crate::{dtos::NoticeResponse, middleware::AuthSession, models::SessionView};

#[derive(Debug, Deserialize)]
pub struct AuthErrorQuery {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginQuery {
    pub callback_url: Option<String>,
}

pub async fn home() -> Json<NoticeResponse> {
    Json(NoticeResponse::new("home", "Hylur energy storage platform"))
}

/// Unsafe return targets are dropped here as they are at `/auth/google`.
pub async fn login(Query(query): Query<LoginQuery>) -> Json<NoticeResponse> {
    let sign_in_url = match query.callback_url.as_deref().and_then(safe_callback) {
        Some(target) => format!("/auth/google?callbackUrl={}", urlencoding::encode(target)),
        None => "/auth/google".to_string(),
    };
    Json(
        NoticeResponse::new("login", "Sign in with your company Google account")
            .with_sign_in_url(sign_in_url),
    )
}

pub async fn auth_error(Query(query): Query<AuthErrorQuery>) -> Json<NoticeResponse> {
    let message = match query.error.as_deref() {
        Some("AccessDenied") => "Access is limited to verified company accounts",
        _ => "Sign-in could not be completed",
    };
    Json(NoticeResponse::new("auth_error", message))
}

pub async fn inactive() -> Json<NoticeResponse> {
    Json(NoticeResponse::new(
        "inactive",
        "This account has been deactivated. Contact an administrator.",
    ))
}

pub async fn unauthorized() -> Json<NoticeResponse> {
    Json(NoticeResponse::new(
        "unauthorized",
        "Your role does not have access to this area",
    ))
}

pub async fn dashboard(session: AuthSession) -> Json<SessionView> {
    Json(session.0.view())
}

pub async fn not_found() -> (StatusCode, Json<NoticeResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(NoticeResponse::new("not_found", "Page not found")),
    )
}
