//! Role model - the closed set of user categories.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User role. Roles are categories, not ranks: what a role may do is decided
/// only by its entry in the permission catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Executive A (business side).
    Ceo,
    /// Executive B (technical side).
    Coo,
    ClientAdmin,
    ClientUser,
    Guest,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Ceo,
        Role::Coo,
        Role::ClientAdmin,
        Role::ClientUser,
        Role::Guest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Ceo => "CEO",
            Role::Coo => "COO",
            Role::ClientAdmin => "CLIENT_ADMIN",
            Role::ClientUser => "CLIENT_USER",
            Role::Guest => "GUEST",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Invalid role: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_string_round_trip_matches_serde() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("ADMIN".parse::<Role>().is_err());
        assert!("ceo".parse::<Role>().is_err());
    }
}
