use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{PermissionCode, RoleCode};

/// The authenticated user as resolved by the server.
///
/// An identity is always replaced as a whole (on login or an explicit
/// identity fetch); there are no setters for individual fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    username: String,
    display_name: String,
    roles: BTreeSet<RoleCode>,
    permissions: BTreeSet<PermissionCode>,
}

impl Identity {
    /// Build an identity. A blank `display_name` falls back to the username.
    pub fn new(
        username: impl Into<String>,
        display_name: Option<String>,
        roles: impl IntoIterator<Item = RoleCode>,
        permissions: impl IntoIterator<Item = PermissionCode>,
    ) -> Self {
        let username = username.into();
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| username.clone());

        Self {
            username,
            display_name,
            roles: roles.into_iter().collect(),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn roles(&self) -> &BTreeSet<RoleCode> {
        &self.roles
    }

    pub fn permissions(&self) -> &BTreeSet<PermissionCode> {
        &self.permissions
    }

    pub fn has_role(&self, role: &RoleCode) -> bool {
        self.roles.contains(role)
    }

    pub fn has_permission(&self, permission: &PermissionCode) -> bool {
        self.permissions.contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_username() {
        let identity = Identity::new("alice", Some("   ".to_string()), [], []);
        assert_eq!(identity.display_name(), "alice");

        let identity = Identity::new("bob", None, [], []);
        assert_eq!(identity.display_name(), "bob");

        let identity = Identity::new("carol", Some("Carol Chen".to_string()), [], []);
        assert_eq!(identity.display_name(), "Carol Chen");
    }

    #[test]
    fn duplicate_roles_collapse_into_a_set() {
        let identity = Identity::new(
            "alice",
            None,
            [RoleCode::new("ADMIN"), RoleCode::new("ADMIN"), RoleCode::new("REPORT_USER")],
            [PermissionCode::new("report:view")],
        );

        assert_eq!(identity.roles().len(), 2);
        assert!(identity.has_role(&RoleCode::new("REPORT_USER")));
        assert!(identity.has_permission(&PermissionCode::new("report:view")));
        assert!(!identity.has_permission(&PermissionCode::new("report:delete")));
    }
}
