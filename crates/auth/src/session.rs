use orgadmin_core::{EntityId, UserId};

use crate::{Permission, PermissionSet, User};

/// The resolved authenticated principal of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub permissions: PermissionSet,
}

impl Session {
    pub fn new(user: User, permissions: PermissionSet) -> Self {
        Self { user, permissions }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn is_active(&self) -> bool {
        self.user.active
    }

    pub fn selected_entity_id(&self) -> Option<EntityId> {
        self.user.selected_entity_id
    }

    /// Entities whose log entries this principal may see.
    pub fn visible_entity_ids(&self) -> &[EntityId] {
        &self.user.entity_ids
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }
}
