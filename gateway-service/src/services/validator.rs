//! Identity assertion validation.

use crate::models::{IdentityAssertion, RejectionReason};

/// An assertion that passed validation. The email is trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub provider: String,
}

#[derive(Debug, Clone)]
pub struct IdentityValidator {
    suffix: String,
}

impl IdentityValidator {
    pub fn new(trusted_domain: &str) -> Self {
        Self {
            suffix: format!("@{}", trusted_domain.trim().to_lowercase()),
        }
    }

    /// Accept only a verified email inside the trusted domain.
    pub fn validate(&self, assertion: &IdentityAssertion) -> Result<VerifiedIdentity, RejectionReason> {
        if !assertion.email_verified {
            return Err(RejectionReason::UnverifiedEmail);
        }

        let email = assertion.email.trim().to_lowercase();
        let local_len = email.len().saturating_sub(self.suffix.len());
        if local_len == 0 || !email.ends_with(&self.suffix) {
            return Err(RejectionReason::DomainRejected);
        }

        Ok(VerifiedIdentity {
            email,
            name: assertion.name.clone(),
            picture: assertion.picture.clone(),
            provider: assertion.provider.clone(),
        })
    }
}
