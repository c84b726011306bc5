//! Facility model and the visibility filter applied to listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::FacilityIds;

pub const STATUS_ACTIVE: &str = "active";

/// Facility entity (storage site).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub location: String,
    /// Capacity in MWh.
    pub capacity: f64,
    pub status: String,
    pub client_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Facility {
    pub fn from_new(new: NewFacility) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            location: new.location,
            capacity: new.capacity,
            status: STATUS_ACTIVE.to_string(),
            client_id: new.client_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request to create a facility.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewFacility {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "Location is required"))]
    pub location: String,
    #[validate(range(min = 0.0, message = "Capacity must not be negative"))]
    pub capacity: f64,
    pub client_id: Option<String>,
}

/// Query filter produced by the visibility resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum FacilityFilter {
    /// No restriction.
    All,
    /// Only facilities with this status.
    Status(String),
    /// Only facilities whose id is in the set; empty set matches nothing.
    Ids(FacilityIds),
}

impl FacilityFilter {
    pub fn matches(&self, facility: &Facility) -> bool {
        match self {
            FacilityFilter::All => true,
            FacilityFilter::Status(status) => facility.status == *status,
            FacilityFilter::Ids(ids) => ids.contains(&facility.id),
        }
    }
}
