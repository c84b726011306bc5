//! Services layer for the gateway.
//!
//! Sign-in, session enrichment and facility visibility, plus the store
//! contracts they depend on.

pub mod audit;
mod auth;
pub mod catalog;
mod database;
pub mod directory;
mod enrichment;
pub mod error;
pub mod facilities;
pub mod identity_provider;
pub mod metrics;
pub mod role_policy;
pub mod sessions;
pub mod validator;
pub mod visibility;

pub use audit::{AuditSink, InMemoryAuditSink, SecurityAuditService};
pub use auth::AuthService;
pub use catalog::PermissionCatalog;
pub use database::Database;
pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use enrichment::SessionEnrichmentService;
pub use error::{GatewayError, StoreError};
pub use facilities::{FacilityStore, InMemoryFacilityStore};
pub use identity_provider::{GoogleIdentityProvider, IdentityProvider, MockIdentityProvider};
pub use role_policy::{RoleAssignment, RoleAssignmentPolicy};
pub use sessions::{InMemorySessionStore, SessionStore};
pub use self::validator::{IdentityValidator, VerifiedIdentity};
pub use visibility::{FacilityListing, FacilityVisibilityResolver, ListingCaller};
