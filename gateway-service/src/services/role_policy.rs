//! First-contact role assignment.

use crate::models::Role;

const FOUNDERS: &[Founder] = &[
    Founder {
        email: "haukur@hylur.net",
        role: Role::Ceo,
        title: "Co-Founder & CEO",
        expertise: "Business Development - 8+ years Energy Sector Experience",
        department: "Executive Leadership",
    },
    Founder {
        email: "leif@hylur.net",
        role: Role::Coo,
        title: "Co-Founder & COO",
        expertise: "Mechatronics Engineering - Energy Systems & AI Implementation",
        department: "Technical Operations",
    },
];

struct Founder {
    email: &'static str,
    role: Role,
    title: &'static str,
    expertise: &'static str,
    department: &'static str,
}

/// Role and profile attributes for a newly seen email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub role: Role,
    pub title: String,
    pub expertise: String,
    pub department: String,
}

impl RoleAssignment {
    fn plain(role: Role, department: &str) -> Self {
        Self {
            role,
            title: String::new(),
            expertise: String::new(),
            department: department.to_string(),
        }
    }
}

/// Pure `email -> RoleAssignment` mapping, consulted only when no directory
/// record exists yet. Rules are tried in order; the first match wins.
#[derive(Debug, Clone)]
pub struct RoleAssignmentPolicy {
    trusted_domain: String,
}

impl RoleAssignmentPolicy {
    pub fn new(trusted_domain: impl Into<String>) -> Self {
        Self {
            trusted_domain: trusted_domain.into().to_lowercase(),
        }
    }

    pub fn assign(&self, email: &str) -> RoleAssignment {
        let email = email.trim().to_lowercase();

        if let Some(founder) = FOUNDERS.iter().find(|f| f.email == email) {
            return RoleAssignment {
                role: founder.role,
                title: founder.title.to_string(),
                expertise: founder.expertise.to_string(),
                department: founder.department.to_string(),
            };
        }

        let in_domain = email.ends_with(&format!("@{}", self.trusted_domain));
        match (in_domain, email.contains("admin")) {
            (false, true) => RoleAssignment::plain(Role::ClientAdmin, "Client"),
            (false, false) => RoleAssignment::plain(Role::ClientUser, "Client"),
            (true, _) => RoleAssignment::plain(Role::Guest, "Team Member"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RoleAssignmentPolicy {
        RoleAssignmentPolicy::new("hylur.net")
    }

    #[test]
    fn test_founders() {
        let ceo = policy().assign("haukur@hylur.net");
        assert_eq!(ceo.role, Role::Ceo);
        assert_eq!(ceo.title, "Co-Founder & CEO");
        assert_eq!(ceo.department, "Executive Leadership");

        let coo = policy().assign("Leif@Hylur.net");
        assert_eq!(coo.role, Role::Coo);
        assert_eq!(coo.department, "Technical Operations");
        assert!(coo.expertise.starts_with("Mechatronics"));
    }

    #[test]
    fn test_team_member_default() {
        let a = policy().assign("new.person@hylur.net");
        assert_eq!(a, RoleAssignment::plain(Role::Guest, "Team Member"));
        assert!(a.title.is_empty());
    }

    #[test]
    fn test_admin_inside_domain_is_still_guest() {
        assert_eq!(policy().assign("sysadmin@hylur.net").role, Role::Guest);
    }

    #[test]
    fn test_client_roles() {
        assert_eq!(policy().assign("client@otherco.com").role, Role::ClientUser);
        let admin = policy().assign("admin@otherco.com");
        assert_eq!(admin.role, Role::ClientAdmin);
        assert_eq!(admin.department, "Client");
    }

    #[test]
    fn test_lookalike_domain_is_not_trusted() {
        assert_eq!(policy().assign("someone@nothylur.net").role, Role::ClientUser);
    }

    #[test]
    fn test_assignment_is_deterministic() {
        assert_eq!(policy().assign("x@hylur.net"), policy().assign("x@hylur.net"));
    }
}
