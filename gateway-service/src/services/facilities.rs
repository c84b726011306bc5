use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StoreError;
use crate::models::{Facility, FacilityFilter, NewFacility};

/// Facility listing collaborator. Listings are newest first.
#[async_trait]
pub trait FacilityStore: Send + Sync {
    async fn list(&self, filter: &FacilityFilter) -> Result<Vec<Facility>, StoreError>;
    async fn create(&self, new_facility: NewFacility) -> Result<Facility, StoreError>;
}

#[derive(Default)]
pub struct InMemoryFacilityStore {
    facilities: DashMap<String, Facility>,
}

impl InMemoryFacilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed facility, keeping its id and status.
    pub fn seed(&self, facility: Facility) {
        self.facilities.insert(facility.id.clone(), facility);
    }

    /// Store preloaded with the demo sites, under stable ids so they can be
    /// assigned to users by hand.
    pub fn with_demo_facilities() -> Self {
        let store = Self::new();
        for (id, name, location, capacity, client_id) in DEMO_FACILITIES {
            let mut facility = Facility::from_new(NewFacility {
                name: name.to_string(),
                location: location.to_string(),
                capacity: *capacity,
                client_id: Some(client_id.to_string()),
            });
            facility.id = id.to_string();
            store.seed(facility);
        }
        store
    }
}

const DEMO_FACILITIES: &[(&str, &str, &str, f64, &str)] = &[
    ("demo-facility-1", "Hylur Demo BESS Facility 1", "Reykjavik, Iceland", 10.5, "demo-client-1"),
    ("demo-facility-2", "Hylur Demo BESS Facility 2", "Akureyri, Iceland", 25.0, "demo-client-2"),
    ("demo-facility-3", "Nordic Energy Storage Hub", "Oslo, Norway", 50.0, "nordic-energy-corp"),
];

#[async_trait]
impl FacilityStore for InMemoryFacilityStore {
    async fn list(&self, filter: &FacilityFilter) -> Result<Vec<Facility>, StoreError> {
        let mut rows: Vec<Facility> = self
            .facilities
            .iter()
            .filter(|f| filter.matches(f.value()))
            .map(|f| f.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn create(&self, new_facility: NewFacility) -> Result<Facility, StoreError> {
        let facility = Facility::from_new(new_facility);
        self.facilities.insert(facility.id.clone(), facility.clone());
        Ok(facility)
    }
}
