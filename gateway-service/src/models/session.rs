//! Session model - point-in-time snapshots issued at sign-in.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{FacilityIds, PermissionSet, Role};

/// Role-derived attributes captured when the session was issued. Not linked
/// to the directory record afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub title: String,
    pub expertise: String,
    pub department: String,
    pub facility_ids: FacilityIds,
    pub permissions: PermissionSet,
    pub is_active: bool,
}

/// Stored session. Only the hash of the bearer token is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub session_id: Uuid,
    pub token_hash_text: String,
    pub snapshot: SessionSnapshot,
    pub created_utc: DateTime<Utc>,
    pub expiry_utc: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a new session expiring `max_age` from now.
    pub fn new(token_hash: String, snapshot: SessionSnapshot, max_age: Duration) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            token_hash_text: token_hash,
            snapshot,
            created_utc: now,
            expiry_utc: now + max_age,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_utc <= now
    }

    /// Check if session is expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn view(&self) -> SessionView {
        SessionView::from(self)
    }
}

/// A freshly issued session together with the only copy of its token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub record: SessionRecord,
}

/// Outbound session object consumed by UI and API layers.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub role: Role,
    pub title: String,
    pub expertise: String,
    pub department: String,
    #[schema(value_type = Vec<String>)]
    pub facility_ids: FacilityIds,
    #[schema(value_type = Vec<String>)]
    pub permissions: PermissionSet,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
}

impl From<&SessionRecord> for SessionView {
    fn from(record: &SessionRecord) -> Self {
        let s = &record.snapshot;
        Self {
            id: s.user_id,
            role: s.role,
            title: s.title.clone(),
            expertise: s.expertise.clone(),
            department: s.department.clone(),
            facility_ids: s.facility_ids.clone(),
            permissions: s.permissions.clone(),
            is_active: s.is_active,
            expires_at: record.expiry_utc,
        }
    }
}
