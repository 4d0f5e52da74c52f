use serde::{Deserialize, Serialize};

use orgadmin_core::RoleId;

use crate::Permission;

/// A named bundle of permissions assignable to users.
///
/// A role flagged `is_system_managed` is the seeded "Super Admin": it is
/// immutable and implicitly holds every permission (see [`crate::PermissionSet`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub is_system_managed: bool,
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn permission_codes(&self) -> Vec<&str> {
        self.permissions.iter().map(Permission::as_str).collect()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}
