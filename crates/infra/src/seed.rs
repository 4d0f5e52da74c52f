//! Idempotent demo data: permission catalog, the Super Admin role and user,
//! and two entities.

use chrono::Utc;
use tracing::{info, instrument};

use orgadmin_auth::permissions::CATALOG;
use orgadmin_auth::{Entity, Role, User};
use orgadmin_core::{EntityId, RoleId, UserId};

use crate::{DirectoryStore, StoreError};

pub const SUPER_ADMIN_ROLE: &str = "Super Admin";
pub const SUPER_ADMIN_NAME: &str = "Super Admin";
pub const SUPER_ADMIN_EMAIL: &str = "admin@admin.com";
pub const SEED_ENTITIES: [&str; 2] = ["Entity 1", "Entity 2"];

/// Ids of the seeded records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub role_id: RoleId,
    pub user_id: UserId,
    pub entity_ids: Vec<EntityId>,
}

/// Create whatever part of the seed data is missing.
///
/// Existing records are matched by flag (role), name (entities) and e-mail
/// (user) and are brought back to the seeded permissions/memberships.
#[instrument(skip(store), err)]
pub async fn seed(store: &dyn DirectoryStore) -> Result<SeedReport, StoreError> {
    for permission in CATALOG {
        store.save_permission(permission).await?;
    }

    let existing_role = store
        .list_roles()
        .await?
        .into_iter()
        .find(|r| r.is_system_managed);
    let role = Role {
        id: existing_role.as_ref().map(|r| r.id).unwrap_or_default(),
        name: SUPER_ADMIN_ROLE.to_string(),
        description: existing_role
            .map(|r| r.description)
            .unwrap_or_else(|| "Full access to every feature".to_string()),
        is_system_managed: true,
        permissions: CATALOG.to_vec(),
    };
    store.save_role(&role).await?;

    let entities = store.list_entities().await?;
    let mut entity_ids = Vec::with_capacity(SEED_ENTITIES.len());
    for name in SEED_ENTITIES {
        match entities.iter().find(|e| e.name == name) {
            Some(entity) => entity_ids.push(entity.id),
            None => {
                let now = Utc::now();
                let entity = Entity {
                    id: EntityId::new(),
                    name: name.to_string(),
                    active: true,
                    created_at: now,
                    updated_at: now,
                };
                store.save_entity(&entity).await?;
                entity_ids.push(entity.id);
            }
        }
    }

    let now = Utc::now();
    let user = match store.find_user_by_email(SUPER_ADMIN_EMAIL).await? {
        Some(mut user) => {
            user.is_system_managed = true;
            user.active = true;
            if !user.role_ids.contains(&role.id) {
                user.role_ids.push(role.id);
            }
            for id in &entity_ids {
                if !user.entity_ids.contains(id) {
                    user.entity_ids.push(*id);
                }
            }
            user.updated_at = now;
            user
        }
        None => User {
            id: UserId::new(),
            name: SUPER_ADMIN_NAME.to_string(),
            email: SUPER_ADMIN_EMAIL.to_string(),
            email_verified: true,
            active: true,
            is_system_managed: true,
            role_ids: vec![role.id],
            entity_ids: entity_ids.clone(),
            selected_entity_id: entity_ids.first().copied(),
            created_at: now,
            updated_at: now,
        },
    };
    store.save_user(&user).await?;

    info!(role_id = %role.id, user_id = %user.id, "seed data in place");
    Ok(SeedReport {
        role_id: role.id,
        user_id: user.id,
        entity_ids,
    })
}
