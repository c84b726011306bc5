//! Session enrichment: the one place a permission set is computed.

use std::sync::Arc;

use super::catalog::PermissionCatalog;
use super::directory::UserDirectory;
use super::error::GatewayError;
use crate::models::{SessionSnapshot, User};

#[derive(Clone)]
pub struct SessionEnrichmentService {
    directory: Arc<dyn UserDirectory>,
    catalog: Arc<PermissionCatalog>,
}

impl SessionEnrichmentService {
    pub fn new(directory: Arc<dyn UserDirectory>, catalog: Arc<PermissionCatalog>) -> Self {
        Self { directory, catalog }
    }

    /// Re-read the directory record for `email` and snapshot it.
    ///
    /// A missing record yields `Unauthenticated`, an inactive one
    /// `AccountInactive`. Directory failures propagate as
    /// `DirectoryUnavailable`.
    pub async fn enrich(&self, email: &str) -> Result<SessionSnapshot, GatewayError> {
        let user = self
            .directory
            .find_by_email(email)
            .await?
            .ok_or(GatewayError::Unauthenticated)?;

        if !user.is_active {
            tracing::info!(user_id = %user.user_id, "Refusing session for inactive account");
            return Err(GatewayError::AccountInactive);
        }

        Ok(self.snapshot(&user))
    }

    pub fn snapshot(&self, user: &User) -> SessionSnapshot {
        SessionSnapshot {
            user_id: user.user_id,
            email: user.email.clone(),
            role: user.role,
            title: user.title.clone(),
            expertise: user.expertise.clone(),
            department: user.department.clone(),
            facility_ids: user.facility_ids.clone(),
            permissions: self.catalog.permissions_for(user.role),
            is_active: user.is_active,
        }
    }
}
