pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    handler::Handler,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get, patch, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::GatewayConfig;
use crate::middleware::{
    guard, metrics_middleware, permission_guard, route_authorization_middleware, session_middleware,
    RouteAuthorizationEngine, RouteRules, SESSION_COOKIE,
};
use crate::models::Permission;
use crate::services::{
    AuditSink, AuthService, Database, FacilityStore, FacilityVisibilityResolver, IdentityProvider,
    IdentityValidator, PermissionCatalog, RoleAssignmentPolicy, SecurityAuditService,
    SessionEnrichmentService, SessionStore, UserDirectory,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::google_login,
        handlers::auth::google_callback,
        handlers::auth::get_session,
        handlers::auth::refresh,
        handlers::auth::signout,
        handlers::facilities::list_facilities,
        handlers::facilities::create_facility,
        handlers::users::update_user,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::DenialResponse,
            dtos::NoticeResponse,
            dtos::auth::SignOutResponse,
            dtos::users::UpdateUserRequest,
            dtos::users::FacilityIdsInput,
            handlers::auth::RefreshResponse,
            models::Role,
            models::Permission,
            models::SessionView,
            models::UserResponse,
            models::Facility,
            models::NewFacility,
            services::FacilityListing,
            services::ListingCaller,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Provider sign-in flow"),
        (name = "Session", description = "Session object, refresh and sign-out"),
        (name = "Facilities", description = "Visibility-scoped facility listing"),
        (name = "Users", description = "Administrative user changes"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            );
        }
    }
}

/// Backing collaborators, chosen by `STORE_BACKEND`.
pub struct Stores {
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionStore>,
    pub facilities: Arc<dyn FacilityStore>,
    pub audit: Arc<dyn AuditSink>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub db: Option<Database>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub auth: AuthService,
    pub directory: Arc<dyn UserDirectory>,
    pub facility_store: Arc<dyn FacilityStore>,
    pub visibility: FacilityVisibilityResolver,
    pub route_engine: Arc<RouteAuthorizationEngine>,
    pub db: Option<Database>,
    pub signin_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(config: GatewayConfig, stores: Stores) -> Self {
        let trusted_domain = config.access.trusted_domain.clone();

        let enrichment = SessionEnrichmentService::new(
            stores.directory.clone(),
            Arc::new(PermissionCatalog::standard()),
        );
        let auth = AuthService::new(
            stores.identity_provider,
            IdentityValidator::new(&trusted_domain),
            RoleAssignmentPolicy::new(trusted_domain),
            stores.directory.clone(),
            stores.sessions,
            enrichment,
            SecurityAuditService::new(stores.audit),
            config.session_max_age(),
        );

        let route_engine = Arc::new(RouteAuthorizationEngine::new(RouteRules::standard(
            config.access.route_default_policy,
        )));
        let signin_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.signin_attempts,
            config.rate_limit.signin_window_seconds,
        );

        Self {
            auth,
            directory: stores.directory,
            visibility: FacilityVisibilityResolver::new(stores.facilities.clone()),
            facility_store: stores.facilities,
            route_engine,
            db: stores.db,
            signin_rate_limiter,
            config,
        }
    }
}

fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_router(state: AppState) -> Router {
    // Page navigation, gated by the route engine. The catch-all keeps
    // unknown paths under the engine too.
    let pages = Router::new()
        .route("/", get(handlers::pages::home))
        .route("/login", get(handlers::pages::login))
        .route("/auth/error", get(handlers::pages::auth_error))
        .route("/auth/inactive", get(handlers::pages::inactive))
        .route("/unauthorized", get(handlers::pages::unauthorized))
        .route("/dashboard", get(handlers::pages::dashboard))
        .route("/*path", any(handlers::pages::not_found))
        .layer(from_fn_with_state(
            state.route_engine.clone(),
            route_authorization_middleware,
        ));

    let sign_in = Router::new()
        .route("/auth/google/callback", get(handlers::auth::google_callback))
        .layer(from_fn_with_state(
            state.signin_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .route("/auth/google", get(handlers::auth::google_login));

    let api = Router::new()
        .route("/api/auth/session", get(handlers::auth::get_session))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/signout", post(handlers::auth::signout))
        .route(
            "/api/facilities",
            get(handlers::facilities::list_facilities
                .layer(from_fn_with_state(guard([]), permission_guard)))
            .post(handlers::facilities::create_facility.layer(from_fn_with_state(
                guard([Permission::ManageAllFacilities]),
                permission_guard,
            )))
            .fallback(handlers::facilities::facilities_method_not_allowed),
        )
        .route(
            "/api/users/:id",
            patch(handlers::users::update_user.layer(from_fn_with_state(
                guard([Permission::UserManagement]),
                permission_guard,
            ))),
        );

    let observability = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );

    Router::new()
        .merge(pages)
        .merge(sign_in)
        .merge(api)
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .merge(observability)
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config))
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let database = match &state.db {
        Some(db) => {
            db.health_check().await.map_err(|e| {
                tracing::error!(error = %e, "PostgreSQL health check failed");
                AppError::ServiceUnavailable("Database unavailable".to_string(), Some(5))
            })?;
            "up"
        }
        None => "in-memory",
    };

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": database
        }
    })))
}
