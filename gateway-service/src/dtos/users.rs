use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::{FacilityIds, Role, UserUpdate};

const MAX_FACILITY_IDS: usize = 1000;
const MAX_FACILITY_ID_LEN: usize = 128;

/// Facility assignment as sent by clients: a JSON array, or the legacy
/// comma-delimited string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FacilityIdsInput {
    List(Vec<String>),
    Delimited(String),
}

impl FacilityIdsInput {
    pub fn into_ids(self) -> FacilityIds {
        match self {
            FacilityIdsInput::List(ids) => FacilityIds::from(ids),
            FacilityIdsInput::Delimited(raw) => FacilityIds::from_delimited(&raw),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_not_empty"))]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    #[validate(custom(function = "validate_facility_ids"))]
    pub facility_ids: Option<FacilityIdsInput>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(req: UpdateUserRequest) -> Self {
        UserUpdate {
            role: req.role,
            is_active: req.is_active,
            facility_ids: req.facility_ids.map(FacilityIdsInput::into_ids),
        }
    }
}

fn validate_not_empty(req: &UpdateUserRequest) -> Result<(), ValidationError> {
    if req.role.is_none() && req.is_active.is_none() && req.facility_ids.is_none() {
        return Err(ValidationError::new("empty_update"));
    }
    Ok(())
}

fn validate_facility_ids(input: &FacilityIdsInput) -> Result<(), ValidationError> {
    let ids = input.clone().into_ids();
    if ids.len() > MAX_FACILITY_IDS || ids.iter().any(|id| id.len() > MAX_FACILITY_ID_LEN) {
        return Err(ValidationError::new("facility_ids_too_large"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_delimited_assignment() {
        let req: UpdateUserRequest =
            serde_json::from_value(serde_json::json!({ "facilityIds": "f2,f1, ,f2" })).unwrap();
        assert!(req.validate().is_ok());
        let update = UserUpdate::from(req);
        assert_eq!(update.facility_ids.unwrap().to_vec(), vec!["f1", "f2"]);
    }

    #[test]
    fn test_array_assignment_and_role() {
        let req: UpdateUserRequest = serde_json::from_value(serde_json::json!({
            "role": "CLIENT_USER",
            "isActive": false,
            "facilityIds": ["f1"]
        }))
        .unwrap();
        let update = UserUpdate::from(req);
        assert_eq!(update.role, Some(Role::ClientUser));
        assert_eq!(update.is_active, Some(false));
    }

    #[test]
    fn test_oversized_assignment_fails_validation() {
        let ids: Vec<String> = (0..=MAX_FACILITY_IDS).map(|i| format!("f{i}")).collect();
        let req: UpdateUserRequest =
            serde_json::from_value(serde_json::json!({ "facilityIds": ids })).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("facility_ids"));

        let long_id = "x".repeat(MAX_FACILITY_ID_LEN + 1);
        let req: UpdateUserRequest =
            serde_json::from_value(serde_json::json!({ "facilityIds": long_id })).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let req: UpdateUserRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(req.validate().is_err());
    }
}
