use serde::Serialize;
use service_core::axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use thiserror::Error;

use crate::models::{Permission, RejectionReason, Role};

/// Seconds a caller should wait before retrying after a store outage.
pub const RETRY_AFTER_SECONDS: u64 = 5;

/// Errors raised at a store boundary (directory, sessions, facilities).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique constraint hit; for the user directory this means the email
    /// already has a record.
    #[error("Record already exists")]
    Conflict,

    #[error("Store unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Unavailable(anyhow::Error::new(err)),
        }
    }
}

/// Gateway decision and failure taxonomy.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Email domain is not permitted")]
    DomainRejected,

    #[error("Email address is not verified")]
    UnverifiedEmail,

    #[error("Identity provider did not confirm the sign-in")]
    ProviderRejected,

    #[error("Directory record already exists")]
    DirectoryConflict,

    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(anyhow::Error),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Session expired")]
    SessionExpired,

    #[error("Account inactive")]
    AccountInactive,

    #[error("Insufficient permissions")]
    InsufficientPermission {
        required: Vec<Permission>,
        user_role: Role,
    },

    #[error("Facility store error: {0}")]
    Store(anyhow::Error),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => GatewayError::DirectoryConflict,
            StoreError::Unavailable(e) => GatewayError::DirectoryUnavailable(e),
        }
    }
}

impl From<RejectionReason> for GatewayError {
    fn from(reason: RejectionReason) -> Self {
        match reason {
            RejectionReason::UnverifiedEmail => GatewayError::UnverifiedEmail,
            RejectionReason::DomainRejected => GatewayError::DomainRejected,
        }
    }
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(err: validator::ValidationErrors) -> Self {
        GatewayError::App(AppError::ValidationError(err))
    }
}

impl GatewayError {
    /// Stable reason code carried in denial bodies.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::DomainRejected => "domain_rejected",
            GatewayError::UnverifiedEmail => "unverified_email",
            GatewayError::ProviderRejected => "provider_rejected",
            GatewayError::DirectoryConflict => "directory_conflict",
            GatewayError::DirectoryUnavailable(_) => "directory_unavailable",
            GatewayError::Unauthenticated => "unauthenticated",
            GatewayError::SessionExpired => "session_expired",
            GatewayError::AccountInactive => "account_inactive",
            GatewayError::InsufficientPermission { .. } => "insufficient_permission",
            GatewayError::Store(_) => "store_error",
            GatewayError::App(_) => "error",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DenialBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<Vec<Permission>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_role: Option<Role>,
}

impl DenialBody {
    fn new(err: &GatewayError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code(),
            required: None,
            user_role: None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::Unauthenticated
            | GatewayError::SessionExpired
            | GatewayError::ProviderRejected => StatusCode::UNAUTHORIZED,
            GatewayError::AccountInactive
            | GatewayError::InsufficientPermission { .. }
            | GatewayError::DomainRejected
            | GatewayError::UnverifiedEmail => StatusCode::FORBIDDEN,
            _ => return AppError::from(self).into_response(),
        };

        let mut body = DenialBody::new(&self);
        if let GatewayError::InsufficientPermission {
            required,
            user_role,
        } = self
        {
            body.required = Some(required);
            body.user_role = Some(user_role);
        }

        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::App(e) => e,
            GatewayError::DirectoryUnavailable(e) => {
                tracing::error!(error = %e, "Directory unavailable, failing closed");
                AppError::ServiceUnavailable(
                    "Access could not be decided; retry later".to_string(),
                    Some(RETRY_AFTER_SECONDS),
                )
            }
            GatewayError::Store(e) => AppError::DatabaseError(e),
            GatewayError::Unauthenticated
            | GatewayError::SessionExpired
            | GatewayError::ProviderRejected => AppError::Unauthorized(anyhow::anyhow!(err.to_string())),
            GatewayError::DirectoryConflict => AppError::InternalError(anyhow::anyhow!(err.to_string())),
            _ => AppError::Forbidden(anyhow::anyhow!(err.to_string())),
        }
    }
}
