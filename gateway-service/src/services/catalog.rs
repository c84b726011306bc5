//! Role to permission-set mapping.
//!
//! Built once at startup and shared behind an `Arc`. Each role has its own
//! explicit entry; no role inherits from another.

use std::collections::HashMap;

use crate::models::{Permission, PermissionSet, Role};

#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    entries: HashMap<Role, PermissionSet>,
}

impl PermissionCatalog {
    /// The production role table.
    pub fn standard() -> Self {
        use Permission::*;

        let mut entries = HashMap::new();
        entries.insert(
            Role::Ceo,
            set(&[
                ExecutiveOversight,
                StrategicPlanning,
                ClientRelationshipManagement,
                BusinessAnalytics,
                SalesManagement,
                PartnershipManagement,
                FinancialReporting,
                UserManagement,
                ManageAllFacilities,
                ViewAllAnalytics,
                GenerateAllReports,
                ManageBusinessOperations,
                SystemConfig,
            ]),
        );
        entries.insert(
            Role::Coo,
            set(&[
                TechnicalOperations,
                AiAnalysisManagement,
                TechnicalDiagnostics,
                EnergySystemAnalytics,
                IntegrationManagement,
                SystemConfig,
                ManageAllFacilities,
                UserManagement,
                ViewAllAnalytics,
                GenerateTechnicalReports,
                ManageDocuments,
                SystemMaintenance,
            ]),
        );
        entries.insert(
            Role::ClientAdmin,
            set(&[
                ViewClientFacilities,
                GenerateClientReports,
                ManageClientUsers,
                AccessClientDocuments,
            ]),
        );
        entries.insert(
            Role::ClientUser,
            set(&[
                ViewAssignedFacilities,
                ViewClientReports,
                AccessAssignedDocuments,
            ]),
        );
        entries.insert(Role::Guest, set(&[ViewPublicInfo]));

        Self { entries }
    }

    pub fn permissions_for(&self, role: Role) -> PermissionSet {
        self.entries.get(&role).cloned().unwrap_or_default()
    }
}

fn set(permissions: &[Permission]) -> PermissionSet {
    permissions.iter().copied().collect()
}
