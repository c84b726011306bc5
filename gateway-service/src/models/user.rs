//! User model - directory records keyed by unique email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{FacilityIds, Role};

/// User entity as held by the user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    /// Lower-cased; never changes after creation.
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub title: String,
    pub expertise: String,
    pub department: String,
    pub facility_ids: FacilityIds,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl User {
    /// Materialize a directory record from creation fields.
    pub fn from_new(new_user: NewUser) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4(),
            email: new_user.email,
            display_name: new_user.display_name,
            avatar_url: new_user.avatar_url,
            role: new_user.role,
            title: new_user.title,
            expertise: new_user.expertise,
            department: new_user.department,
            facility_ids: FacilityIds::new(),
            is_active: true,
            created_utc: now,
            updated_utc: now,
        }
    }

    /// Apply an administrative update in place.
    pub fn apply(&mut self, update: &UserUpdate) {
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        if let Some(facility_ids) = &update.facility_ids {
            self.facility_ids = facility_ids.clone();
        }
        self.updated_utc = Utc::now();
    }

    /// Convert to sanitized response (no contact details).
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// Profile fields for a first-contact directory write.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub title: String,
    pub expertise: String,
    pub department: String,
}

/// Administrative changes; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub facility_ids: Option<FacilityIds>,
}

/// User response for API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub role: Role,
    pub title: String,
    pub expertise: String,
    pub department: String,
    #[schema(value_type = Vec<String>)]
    pub facility_ids: FacilityIds,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.user_id,
            role: u.role,
            title: u.title,
            expertise: u.expertise,
            department: u.department,
            facility_ids: u.facility_ids,
            is_active: u.is_active,
            updated_at: u.updated_utc,
        }
    }
}
