pub mod guard;
pub mod metrics;
pub mod route_authz;
pub mod session;

pub use guard::{guard, permission_guard, RequiredPermissions};
pub use metrics::metrics_middleware;
pub use route_authz::{
    route_authorization_middleware, DenialReason, RouteAuthorizationEngine, RouteDecision, RouteRules,
    RouteVerdict,
};
pub use session::{session_middleware, session_token, AuthSession, SESSION_COOKIE};
