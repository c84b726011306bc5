//! Permission tokens.
//!
//! The vocabulary is fixed; tokens carry no structure and are only ever
//! compared for set membership.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

macro_rules! permissions {
    ($($variant:ident => $token:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
        pub enum Permission {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl Permission {
            pub const ALL: &'static [Permission] = &[$(Permission::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Permission::$variant => $token,)+
                }
            }
        }

        impl std::str::FromStr for Permission {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok(Permission::$variant),)+
                    _ => Err(format!("Unknown permission: {}", s)),
                }
            }
        }
    };
}

permissions! {
    ExecutiveOversight => "executive_oversight",
    StrategicPlanning => "strategic_planning",
    ClientRelationshipManagement => "client_relationship_management",
    BusinessAnalytics => "business_analytics",
    SalesManagement => "sales_management",
    PartnershipManagement => "partnership_management",
    FinancialReporting => "financial_reporting",
    UserManagement => "user_management",
    ManageAllFacilities => "manage_all_facilities",
    ViewAllAnalytics => "view_all_analytics",
    GenerateAllReports => "generate_all_reports",
    ManageBusinessOperations => "manage_business_operations",
    SystemConfig => "system_config",
    TechnicalOperations => "technical_operations",
    AiAnalysisManagement => "ai_analysis_management",
    TechnicalDiagnostics => "technical_diagnostics",
    EnergySystemAnalytics => "energy_system_analytics",
    IntegrationManagement => "integration_management",
    GenerateTechnicalReports => "generate_technical_reports",
    ManageDocuments => "manage_documents",
    SystemMaintenance => "system_maintenance",
    ViewClientFacilities => "view_client_facilities",
    GenerateClientReports => "generate_client_reports",
    ManageClientUsers => "manage_client_users",
    AccessClientDocuments => "access_client_documents",
    ViewAssignedFacilities => "view_assigned_facilities",
    ViewClientReports => "view_client_reports",
    AccessAssignedDocuments => "access_assigned_documents",
    ViewPublicInfo => "view_public_info",
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unordered set of permissions, serialized as a sorted array of tokens.
pub type PermissionSet = BTreeSet<Permission>;

/// Strict containment: every required permission must be granted.
pub fn contains_all(granted: &PermissionSet, required: &[Permission]) -> bool {
    required.iter().all(|p| granted.contains(p))
}
