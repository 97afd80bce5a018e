//! Role model and the static role → permission table.
//!
//! Permission codes have the form `action:resource` (for example
//! `update:feedback`). A role's codes are fixed at compile time; the session
//! only stores the role name and the codes are derived on every request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Member,
    Finance,
    ElectoralCommission,
    User,
}

pub const ALL_ROLES: [Role; 6] = [
    Role::SuperAdmin,
    Role::Admin,
    Role::Member,
    Role::Finance,
    Role::ElectoralCommission,
    Role::User,
];

const USER_PERMS: &[&str] = &["create:feedback", "read:news", "read:events"];

const MEMBER_PERMS: &[&str] = &[
    "create:feedback", "read:news", "read:events",
    "create:news", "create:events",
];

const FINANCE_PERMS: &[&str] = &[
    "create:feedback", "read:news", "read:events",
    "read:users",
];

const ELECTORAL_PERMS: &[&str] = &[
    "create:feedback", "read:news", "read:events",
    "create:news", "read:users",
];

const ADMIN_PERMS: &[&str] = &[
    "create:feedback", "read:feedback", "update:feedback", "delete:feedback",
    "read:news", "create:news", "update:news", "delete:news",
    "read:events", "create:events", "update:events", "delete:events",
    "read:users", "update:users",
];

const SUPER_ADMIN_EXTRA: &[&str] = &["manage:super_admin"];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Member => "member",
            Role::Finance => "finance",
            Role::ElectoralCommission => "electoral_commission",
            Role::User => "user",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Member => "SRC Member",
            Role::Finance => "Finance",
            Role::ElectoralCommission => "Electoral Commission",
            Role::User => "Student",
        }
    }

    /// `isAdmin` in the page layer: both admin tiers.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }

    pub fn permission_codes(&self) -> Vec<&'static str> {
        match self {
            Role::SuperAdmin => ADMIN_PERMS.iter().chain(SUPER_ADMIN_EXTRA).copied().collect(),
            Role::Admin => ADMIN_PERMS.to_vec(),
            Role::Member => MEMBER_PERMS.to_vec(),
            Role::Finance => FINANCE_PERMS.to_vec(),
            Role::ElectoralCommission => ELECTORAL_PERMS.to_vec(),
            Role::User => USER_PERMS.to_vec(),
        }
    }

    pub fn has_permission(&self, action: &str, resource: &str) -> bool {
        let code = format!("{action}:{resource}");
        self.permission_codes().iter().any(|c| *c == code)
    }

    /// Roles that list at least this permission code.
    pub fn holding(code: &str) -> Vec<Role> {
        ALL_ROLES
            .iter()
            .copied()
            .filter(|r| r.permission_codes().contains(&code))
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ROLES
            .iter()
            .copied()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| format!("unknown role '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_names() {
        for role in ALL_ROLES {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn only_admins_update_feedback() {
        assert!(Role::Admin.has_permission("update", "feedback"));
        assert!(Role::SuperAdmin.has_permission("update", "feedback"));
        for role in [Role::Member, Role::Finance, Role::ElectoralCommission, Role::User] {
            assert!(!role.has_permission("update", "feedback"), "{role} must not update feedback");
        }
    }

    #[test]
    fn everyone_may_submit_feedback() {
        for role in ALL_ROLES {
            assert!(role.has_permission("create", "feedback"));
        }
    }

    #[test]
    fn holding_lists_roles_with_code() {
        let readers = Role::holding("read:feedback");
        assert_eq!(readers, vec![Role::SuperAdmin, Role::Admin]);
    }

    #[test]
    fn super_admin_management_is_exclusive() {
        assert_eq!(Role::holding("manage:super_admin"), vec![Role::SuperAdmin]);
    }
}
