//! Path-level authorization for page navigation.
//!
//! Rules are evaluated in a fixed order: excluded prefixes, public allow-list,
//! session presence, account activation, then the first route group whose
//! prefix matches. A path outside every group falls through to the configured
//! default policy.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::session::AuthSession;
use crate::config::DefaultPolicy;
use crate::models::{Role, SessionSnapshot};
use crate::services::metrics;

pub const LOGIN_PATH: &str = "/login";
pub const INACTIVE_PATH: &str = "/auth/inactive";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

#[derive(Debug, Clone)]
pub struct RouteGroup {
    pub name: &'static str,
    pub prefixes: Vec<String>,
    pub allowed_roles: BTreeSet<Role>,
}

impl RouteGroup {
    fn new(name: &'static str, prefixes: &[&str], allowed_roles: &[Role]) -> Self {
        Self {
            name,
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            allowed_roles: allowed_roles.iter().copied().collect(),
        }
    }

    /// Plain prefix test, so `/admin` also covers `/administration`.
    fn matches(&self, path: &str) -> bool {
        self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Ordered route configuration.
#[derive(Debug, Clone)]
pub struct RouteRules {
    /// Prefixes the engine never gates; API routes carry their own guards.
    pub excluded_prefixes: Vec<String>,
    pub public_paths: Vec<String>,
    pub groups: Vec<RouteGroup>,
    pub default_policy: DefaultPolicy,
}

impl RouteRules {
    pub fn standard(default_policy: DefaultPolicy) -> Self {
        let executives = [Role::Ceo, Role::Coo];
        Self {
            excluded_prefixes: vec!["/api/".to_string()],
            public_paths: ["/", LOGIN_PATH, "/auth/error", INACTIVE_PATH, UNAUTHORIZED_PATH]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            groups: vec![
                RouteGroup::new(
                    "executive",
                    &["/admin", "/users", "/system-config", "/strategic-planning"],
                    &executives,
                ),
                RouteGroup::new(
                    "business",
                    &["/clients", "/partnerships", "/sales", "/business-analytics", "/financial"],
                    &executives,
                ),
                RouteGroup::new(
                    "technical",
                    &["/technical", "/diagnostics", "/integrations", "/ai-management"],
                    &executives,
                ),
            ],
            default_policy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    Unauthenticated,
    Inactive,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allowed,
    Denied(DenialReason),
}

/// A decision plus whether it came from the default policy because no
/// route group matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteVerdict {
    pub decision: RouteDecision,
    pub unknown_route: bool,
}

impl From<RouteDecision> for RouteVerdict {
    fn from(decision: RouteDecision) -> Self {
        Self {
            decision,
            unknown_route: false,
        }
    }
}

impl RouteDecision {
    fn label(&self) -> &'static str {
        match self {
            RouteDecision::Allowed => "allowed",
            RouteDecision::Denied(DenialReason::Unauthenticated) => "unauthenticated",
            RouteDecision::Denied(DenialReason::Inactive) => "inactive",
            RouteDecision::Denied(DenialReason::Forbidden) => "forbidden",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteAuthorizationEngine {
    rules: RouteRules,
}

impl RouteAuthorizationEngine {
    pub fn new(rules: RouteRules) -> Self {
        Self { rules }
    }

    pub fn decide(&self, path: &str, session: Option<&SessionSnapshot>) -> RouteDecision {
        self.evaluate(path, session).decision
    }

    pub fn evaluate(&self, path: &str, session: Option<&SessionSnapshot>) -> RouteVerdict {
        if self.rules.excluded_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return RouteDecision::Allowed.into();
        }

        if self.rules.public_paths.iter().any(|p| p == path) {
            return RouteDecision::Allowed.into();
        }

        let Some(session) = session else {
            return RouteDecision::Denied(DenialReason::Unauthenticated).into();
        };

        if !session.is_active {
            return RouteDecision::Denied(DenialReason::Inactive).into();
        }

        if let Some(group) = self.rules.groups.iter().find(|g| g.matches(path)) {
            if group.allowed_roles.contains(&session.role) {
                return RouteDecision::Allowed.into();
            }
            tracing::info!(path, group = group.name, role = %session.role, "Route forbidden for role");
            return RouteDecision::Denied(DenialReason::Forbidden).into();
        }

        let decision = match self.rules.default_policy {
            DefaultPolicy::Allow => {
                tracing::warn!(path, role = %session.role, "UnknownRoute: no route group matched, allowing");
                RouteDecision::Allowed
            }
            DefaultPolicy::Deny => {
                tracing::warn!(path, role = %session.role, "UnknownRoute: no route group matched, denying");
                RouteDecision::Denied(DenialReason::Forbidden)
            }
        };
        RouteVerdict {
            decision,
            unknown_route: true,
        }
    }
}

/// `/login?callbackUrl=<path and query>`.
fn login_redirect(req: &Request) -> Redirect {
    let original = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Redirect::to(&format!(
        "{}?callbackUrl={}",
        LOGIN_PATH,
        urlencoding::encode(original)
    ))
}

pub async fn route_authorization_middleware(
    State(engine): State<Arc<RouteAuthorizationEngine>>,
    req: Request,
    next: Next,
) -> Response {
    let session = req.extensions().get::<AuthSession>().map(|s| &s.0.snapshot);
    let verdict = engine.evaluate(req.uri().path(), session);
    metrics::record_route_decision(verdict.decision.label());
    if verdict.unknown_route {
        metrics::record_unknown_route();
    }

    match verdict.decision {
        RouteDecision::Allowed => next.run(req).await,
        RouteDecision::Denied(DenialReason::Unauthenticated) => login_redirect(&req).into_response(),
        RouteDecision::Denied(DenialReason::Inactive) => Redirect::to(INACTIVE_PATH).into_response(),
        RouteDecision::Denied(DenialReason::Forbidden) => {
            Redirect::to(UNAUTHORIZED_PATH).into_response()
        }
    }
}
