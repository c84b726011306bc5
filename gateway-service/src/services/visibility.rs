//! Facility visibility scoping.

use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::error::GatewayError;
use super::facilities::FacilityStore;
use crate::models::{Facility, FacilityFilter, Permission, Role, SessionSnapshot, STATUS_ACTIVE};

/// Map a session to the filter its facility queries must carry. Decided by
/// permission membership only.
pub fn resolve_filter(snapshot: &SessionSnapshot) -> FacilityFilter {
    if snapshot.permissions.contains(&Permission::ManageAllFacilities) {
        FacilityFilter::All
    } else if snapshot.permissions.contains(&Permission::ViewClientFacilities) {
        FacilityFilter::Status(STATUS_ACTIVE.to_string())
    } else {
        FacilityFilter::Ids(snapshot.facility_ids.clone())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingCaller {
    pub role: Role,
    pub facility_count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FacilityListing {
    pub success: bool,
    pub data: Vec<Facility>,
    pub user: ListingCaller,
}

#[derive(Clone)]
pub struct FacilityVisibilityResolver {
    store: Arc<dyn FacilityStore>,
}

impl FacilityVisibilityResolver {
    pub fn new(store: Arc<dyn FacilityStore>) -> Self {
        Self { store }
    }

    /// List the facilities visible to `snapshot`. The store result is
    /// filtered again here so a store that ignores the filter cannot widen
    /// the result.
    pub async fn list_visible(&self, snapshot: &SessionSnapshot) -> Result<FacilityListing, GatewayError> {
        let filter = resolve_filter(snapshot);

        if matches!(&filter, FacilityFilter::Ids(ids) if ids.is_empty()) {
            return Ok(listing(snapshot, Vec::new()));
        }

        let data: Vec<Facility> = self
            .store
            .list(&filter)
            .await
            .map_err(|e| GatewayError::Store(anyhow::Error::new(e)))?
            .into_iter()
            .filter(|f| filter.matches(f))
            .collect();

        Ok(listing(snapshot, data))
    }
}

fn listing(snapshot: &SessionSnapshot, data: Vec<Facility>) -> FacilityListing {
    FacilityListing {
        success: true,
        user: ListingCaller {
            role: snapshot.role,
            facility_count: data.len(),
        },
        data,
    }
}
