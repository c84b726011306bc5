use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::session::AuthSession;
use crate::models::{contains_all, Permission, SessionRecord};
use crate::services::GatewayError;

/// Permissions an operation requires. Empty means any active session.
#[derive(Debug, Clone)]
pub struct RequiredPermissions(pub Arc<[Permission]>);

pub fn guard<const N: usize>(required: [Permission; N]) -> RequiredPermissions {
    RequiredPermissions(Arc::from(required.as_slice()))
}

/// Check a resolved session against `required`.
pub fn authorize(session: Option<&SessionRecord>, required: &[Permission]) -> Result<(), GatewayError> {
    let record = session.ok_or(GatewayError::Unauthenticated)?;
    let snapshot = &record.snapshot;

    if !snapshot.is_active {
        return Err(GatewayError::AccountInactive);
    }

    if !contains_all(&snapshot.permissions, required) {
        tracing::info!(
            user_id = %snapshot.user_id,
            role = %snapshot.role,
            required = ?required,
            "Insufficient permissions"
        );
        return Err(GatewayError::InsufficientPermission {
            required: required.to_vec(),
            user_role: snapshot.role,
        });
    }

    Ok(())
}

/// Wraps one protected operation. Use with
/// `from_fn_with_state(guard([..]), permission_guard)`.
pub async fn permission_guard(
    State(required): State<RequiredPermissions>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    authorize(req.extensions().get::<AuthSession>().map(|s| &s.0), &required.0)?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, SessionSnapshot};
    use crate::services::PermissionCatalog;
    use chrono::Duration;
    use uuid::Uuid;

    fn record(role: Role, is_active: bool) -> SessionRecord {
        SessionRecord::new(
            "hash".to_string(),
            SessionSnapshot {
                user_id: Uuid::new_v4(),
                email: "x@hylur.net".to_string(),
                role,
                title: String::new(),
                expertise: String::new(),
                department: String::new(),
                facility_ids: Default::default(),
                permissions: PermissionCatalog::standard().permissions_for(role),
                is_active,
            },
            Duration::hours(1),
        )
    }

    #[test]
    fn test_manage_all_facilities() {
        let required = [Permission::ManageAllFacilities];
        assert!(authorize(Some(&record(Role::Ceo, true)), &required).is_ok());
        assert!(matches!(
            authorize(Some(&record(Role::ClientUser, true)), &required),
            Err(GatewayError::InsufficientPermission { user_role: Role::ClientUser, .. })
        ));
    }

    #[test]
    fn test_missing_and_inactive_sessions() {
        assert!(matches!(authorize(None, &[]), Err(GatewayError::Unauthenticated)));
        assert!(matches!(
            authorize(Some(&record(Role::Ceo, false)), &[]),
            Err(GatewayError::AccountInactive)
        ));
    }

    #[test]
    fn test_requirements_are_a_conjunction() {
        let coo = record(Role::Coo, true);
        assert!(authorize(Some(&coo), &[Permission::SystemConfig, Permission::UserManagement]).is_ok());
        assert!(authorize(
            Some(&coo),
            &[Permission::SystemConfig, Permission::FinancialReporting]
        )
        .is_err());
        assert!(authorize(Some(&record(Role::Guest, true)), &[]).is_ok());
    }
}
