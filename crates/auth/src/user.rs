//! User account records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgadmin_core::{EntityId, RoleId, UserId};

use crate::{Entity, Role};

/// User account.
///
/// # Invariants
/// - `active == false` invalidates every session of the user.
/// - `selected_entity_id`, when set, is one of `entity_ids`.
/// - A user flagged `is_system_managed` cannot be deleted or disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub active: bool,
    pub is_system_managed: bool,
    pub role_ids: Vec<RoleId>,
    pub entity_ids: Vec<EntityId>,
    pub selected_entity_id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn belongs_to(&self, entity_id: EntityId) -> bool {
        self.entity_ids.contains(&entity_id)
    }
}

/// A user together with its resolved roles and entities (list views).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
    pub entities: Vec<Entity>,
}
