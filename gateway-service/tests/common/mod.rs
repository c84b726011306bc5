//! Shared setup for gateway integration tests.
//!
//! Every test gets its own in-memory stores and a fresh router; requests are
//! driven with `oneshot`, so no listener is bound.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use gateway_service::{
    build_router,
    config::{
        AccessConfig, DatabaseConfig, DefaultPolicy, Environment, GatewayConfig,
        GoogleOAuthConfig, RateLimitConfig, SecurityConfig, SessionConfig, StoreBackend,
    },
    models::{IdentityAssertion, Role, UserUpdate},
    services::{
        InMemoryAuditSink, InMemoryFacilityStore, InMemorySessionStore, InMemoryUserDirectory,
        MockIdentityProvider, UserDirectory,
    },
    AppState, Stores,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TRUSTED_DOMAIN: &str = "hylur.net";
pub const CEO_EMAIL: &str = "haukur@hylur.net";
pub const COO_EMAIL: &str = "leif@hylur.net";

pub fn test_config(default_policy: DefaultPolicy) -> GatewayConfig {
    GatewayConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "gateway-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        store_backend: StoreBackend::Memory,
        seed_demo_facilities: false,
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            min_connections: 1,
        },
        google: GoogleOAuthConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "http://localhost:8080/auth/google/callback".to_string(),
        },
        session: SessionConfig {
            max_age_hours: 24,
            cookie_secure: false,
        },
        access: AccessConfig {
            trusted_domain: TRUSTED_DOMAIN.to_string(),
            route_default_policy: default_policy,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            signin_attempts: 100,
            signin_window_seconds: 60,
        },
    }
}

pub fn assertion(email: &str) -> IdentityAssertion {
    IdentityAssertion {
        email: email.to_string(),
        email_verified: true,
        name: Some("Test Person".to_string()),
        picture: None,
        provider: "google".to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub directory: Arc<InMemoryUserDirectory>,
    pub sessions: Arc<InMemorySessionStore>,
    pub facilities: Arc<InMemoryFacilityStore>,
    pub audit: Arc<InMemoryAuditSink>,
    pub provider: Arc<MockIdentityProvider>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_config(test_config(DefaultPolicy::Allow))
    }

    pub fn with_config(config: GatewayConfig) -> Self {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let facilities = Arc::new(InMemoryFacilityStore::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let provider = Arc::new(MockIdentityProvider::new());

        let stores = Stores {
            directory: directory.clone(),
            sessions: sessions.clone(),
            facilities: facilities.clone(),
            audit: audit.clone(),
            identity_provider: provider.clone(),
            db: None,
        };

        let state = AppState::new(config, stores);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            directory,
            sessions,
            facilities,
            audit,
            provider,
        }
    }

    /// Sign in directly through the auth service and return the bearer token.
    pub async fn sign_in(&self, email: &str) -> String {
        self.state
            .auth
            .sign_in(&assertion(email))
            .await
            .expect("sign-in should succeed")
            .token
    }

    /// Sign in, move the user to `role`, and sign in again so the new session
    /// carries that role.
    pub async fn sign_in_as(&self, email: &str, role: Role, facility_ids: &[&str]) -> String {
        self.sign_in(email).await;
        self.set_user(
            email,
            UserUpdate {
                role: Some(role),
                facility_ids: Some(facility_ids.iter().copied().collect()),
                ..Default::default()
            },
        )
        .await;
        self.sign_in(email).await
    }

    pub async fn set_user(&self, email: &str, update: UserUpdate) {
        let user = self
            .directory
            .find_by_email(email)
            .await
            .unwrap()
            .expect("user should exist");
        self.directory.update(user.user_id, update).await.unwrap();
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.request(Method::GET, uri, token, None).await
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect should carry a location")
}
