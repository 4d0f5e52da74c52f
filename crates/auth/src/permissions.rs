use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are opaque codes (e.g. "role_edit"). The set of codes the
/// system knows about is fixed by [`CATALOG`] and seeded into the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this code is part of the seeded catalog.
    pub fn is_known(&self) -> bool {
        CATALOG.iter().any(|p| p.as_str() == self.as_str())
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const USER_CREATE: Permission = Permission::from_static("user_create");
pub const USER_EDIT: Permission = Permission::from_static("user_edit");
pub const USER_DELETE: Permission = Permission::from_static("user_delete");
pub const USER_DISABLE: Permission = Permission::from_static("user_disable");
pub const ROLE_CREATE: Permission = Permission::from_static("role_create");
pub const ROLE_EDIT: Permission = Permission::from_static("role_edit");
pub const ROLE_DELETE: Permission = Permission::from_static("role_delete");
pub const ENTITY_CREATE: Permission = Permission::from_static("entity_create");
pub const ENTITY_EDIT: Permission = Permission::from_static("entity_edit");
pub const ENTITY_DISABLE: Permission = Permission::from_static("entity_disable");
pub const LOG_VIEW: Permission = Permission::from_static("log_view");

/// Every permission code known to the system.
pub const CATALOG: &[Permission] = &[
    USER_CREATE,
    USER_EDIT,
    USER_DELETE,
    USER_DISABLE,
    ROLE_CREATE,
    ROLE_EDIT,
    ROLE_DELETE,
    ENTITY_CREATE,
    ENTITY_EDIT,
    ENTITY_DISABLE,
    LOG_VIEW,
];

/// Effective permissions of a principal.
///
/// Built as the union of the permissions of every assigned role. A
/// system-managed role grants everything, whatever it lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    codes: BTreeSet<Permission>,
    all: bool,
}

impl PermissionSet {
    pub fn from_roles<'a>(roles: impl IntoIterator<Item = &'a Role>) -> Self {
        let mut set = Self::default();
        for role in roles {
            set.grant_role(role);
        }
        set
    }

    pub fn grant_role(&mut self, role: &Role) {
        if role.is_system_managed {
            self.all = true;
        }
        self.codes.extend(role.permissions.iter().cloned());
    }

    pub fn contains(&self, permission: &Permission) -> bool {
        self.all || self.codes.contains(permission)
    }

    pub fn grants_all(&self) -> bool {
        self.all
    }

    /// Codes held, sorted. A set that grants everything lists the full catalog.
    pub fn codes(&self) -> Vec<Permission> {
        if self.all {
            let mut all: BTreeSet<Permission> = CATALOG.iter().cloned().collect();
            all.extend(self.codes.iter().cloned());
            all.into_iter().collect()
        } else {
            self.codes.iter().cloned().collect()
        }
    }
}
