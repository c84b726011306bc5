use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dtos::{
        auth::{GoogleCallbackQuery, GoogleLoginQuery, SignOutResponse},
        DenialResponse, ErrorResponse,
    },
    middleware::{session_token, AuthSession, SESSION_COOKIE},
    models::{ProviderCallback, SessionView},
    services::{identity_provider::google_authorization_url, GatewayError},
    utils::{generate_token, pkce_challenge},
    AppState,
};

const STATE_COOKIE: &str = "oauth_state";
const VERIFIER_COOKIE: &str = "code_verifier";
const CALLBACK_COOKIE: &str = "callback_url";
const DEFAULT_LANDING: &str = "/dashboard";

/// Rotated session: the new bearer token and its session object.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub token: String,
    pub session: SessionView,
}

/// Only same-origin relative paths are accepted as post-sign-in targets.
pub(crate) fn safe_callback(target: &str) -> Option<&str> {
    let ok = target.starts_with('/') && !target.starts_with("//") && !target.contains('\\');
    ok.then_some(target)
}

fn flow_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(10))
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.session.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(state.config.session_hours()))
        .build()
}

fn clear_flow(jar: CookieJar) -> CookieJar {
    jar.remove(removal(STATE_COOKIE))
        .remove(removal(VERIFIER_COOKIE))
        .remove(removal(CALLBACK_COOKIE))
}

fn error_redirect(kind: &str) -> Response {
    Redirect::to(&format!("/auth/error?error={}", kind)).into_response()
}

/// Start the Google sign-in flow
#[utoipa::path(
    get,
    path = "/auth/google",
    params(GoogleLoginQuery),
    responses((status = 303, description = "Redirect to the identity provider")),
    tag = "Authentication"
)]
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<GoogleLoginQuery>,
) -> (CookieJar, Redirect) {
    let oauth_state = uuid::Uuid::new_v4().to_string();
    let code_verifier = generate_token();
    let url = google_authorization_url(
        &state.config.google,
        &state.config.access.trusted_domain,
        &oauth_state,
        &pkce_challenge(&code_verifier),
    );

    let secure = state.config.session.cookie_secure;
    let mut jar = jar
        .add(flow_cookie(STATE_COOKIE, oauth_state, secure))
        .add(flow_cookie(VERIFIER_COOKIE, code_verifier, secure));

    if let Some(target) = query.callback_url.as_deref().and_then(safe_callback) {
        jar = jar.add(flow_cookie(CALLBACK_COOKIE, target.to_string(), secure));
    }

    (jar, Redirect::to(&url))
}

/// Provider redirect target: validate, provision and issue the session cookie
#[utoipa::path(
    get,
    path = "/auth/google/callback",
    params(GoogleCallbackQuery),
    responses(
        (status = 303, description = "Signed in, or redirected to the error page"),
        (status = 503, description = "User directory unavailable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<GoogleCallbackQuery>,
) -> Result<(CookieJar, Response), GatewayError> {
    if let Some(error) = &query.error {
        tracing::info!(provider_error = %error, "Provider returned an error to the callback");
        return Ok((clear_flow(jar), error_redirect("AccessDenied")));
    }

    let stored_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let verifier = jar.get(VERIFIER_COOKIE).map(|c| c.value().to_string());
    let (Some(code), Some(returned_state), Some(stored_state), Some(code_verifier)) =
        (query.code, query.state, stored_state, verifier)
    else {
        tracing::warn!("Sign-in callback missing code, state or verifier");
        return Ok((clear_flow(jar), error_redirect("OAuthCallback")));
    };

    if returned_state != stored_state {
        tracing::warn!("Sign-in callback state mismatch");
        return Ok((clear_flow(jar), error_redirect("OAuthCallback")));
    }

    let landing = jar
        .get(CALLBACK_COOKIE)
        .and_then(|c| safe_callback(c.value()).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LANDING.to_string());

    let callback = ProviderCallback {
        code,
        code_verifier,
    };

    match state.auth.sign_in_with_provider(callback).await {
        Ok(issued) => {
            let jar = clear_flow(jar).add(session_cookie(&state, issued.token));
            Ok((jar, Redirect::to(&landing).into_response()))
        }
        Err(e @ GatewayError::DirectoryUnavailable(_)) => Err(e),
        Err(GatewayError::AccountInactive) => {
            Ok((clear_flow(jar), Redirect::to("/auth/inactive").into_response()))
        }
        Err(GatewayError::ProviderRejected) => Ok((clear_flow(jar), error_redirect("OAuthCallback"))),
        Err(e) => {
            tracing::info!(code = e.code(), "Sign-in refused");
            Ok((clear_flow(jar), error_redirect("AccessDenied")))
        }
    }
}

/// Current session object
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Enriched session", body = SessionView),
        (status = 401, description = "No session", body = DenialResponse),
        (status = 403, description = "Account inactive", body = DenialResponse)
    ),
    tag = "Session",
    security(("session_cookie" = []), ("bearer_auth" = []))
)]
pub async fn get_session(session: AuthSession) -> Result<Json<SessionView>, GatewayError> {
    if !session.0.snapshot.is_active {
        return Err(GatewayError::AccountInactive);
    }
    Ok(Json(session.0.view()))
}

/// Re-enrich the session from the directory and rotate its token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Session rotated", body = RefreshResponse),
        (status = 401, description = "No session", body = DenialResponse),
        (status = 403, description = "Account inactive", body = DenialResponse),
        (status = 503, description = "User directory unavailable", body = ErrorResponse)
    ),
    tag = "Session",
    security(("session_cookie" = []), ("bearer_auth" = []))
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>), GatewayError> {
    let token = session_token(&headers).ok_or(GatewayError::Unauthenticated)?;
    let issued = state.auth.refresh(&token).await?;

    let jar = jar.add(session_cookie(&state, issued.token.clone()));
    Ok((
        jar,
        Json(RefreshResponse {
            token: issued.token,
            session: issued.record.view(),
        }),
    ))
}

/// Destroy the current session
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses((status = 200, description = "Signed out", body = SignOutResponse)),
    tag = "Session"
)]
pub async fn signout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SignOutResponse>), GatewayError> {
    if let Some(token) = session_token(&headers) {
        state.auth.sign_out(&token).await?;
    }
    Ok((
        jar.remove(removal(SESSION_COOKIE)),
        Json(SignOutResponse { success: true }),
    ))
}
