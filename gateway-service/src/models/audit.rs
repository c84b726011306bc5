//! Sign-in rejection audit records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Why an identity assertion was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    UnverifiedEmail,
    DomainRejected,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::UnverifiedEmail => "unverified_email",
            RejectionReason::DomainRejected => "domain_rejected",
        }
    }
}

/// Audit entry for a refused sign-in. Holds the email and reason only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignInRejection {
    pub rejection_id: Uuid,
    pub email: String,
    pub provider: String,
    pub reason: RejectionReason,
    pub created_utc: DateTime<Utc>,
}

impl SignInRejection {
    pub fn new(email: impl Into<String>, provider: impl Into<String>, reason: RejectionReason) -> Self {
        Self {
            rejection_id: Uuid::new_v4(),
            email: email.into(),
            provider: provider.into(),
            reason,
            created_utc: Utc::now(),
        }
    }
}
