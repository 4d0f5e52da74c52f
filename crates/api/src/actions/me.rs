//! Actions on the caller's own account.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use orgadmin_auth::{Entity, Permission, Role, Session, User, check_auth};
use orgadmin_core::EntityId;
use orgadmin_infra::DirectoryStore;

use super::{ActionError, ActionResult};
use crate::context::AppState;

/// The signed-in user with effective permissions.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
    pub entities: Vec<Entity>,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectEntityInput {
    pub entity_id: EntityId,
}

pub async fn get_current_user(
    state: &AppState,
    session: Option<&Session>,
) -> ActionResult<CurrentUser> {
    let session = check_auth(session, None)?;

    let roles = state.directory.roles_of(&session.user).await?;
    let entities = state
        .directory
        .list_entities()
        .await?
        .into_iter()
        .filter(|e| session.user.belongs_to(e.id))
        .collect();

    Ok(CurrentUser {
        user: session.user.clone(),
        roles,
        entities,
        permissions: session.permissions.codes(),
    })
}

/// Switch the caller's working entity. It must be one of theirs and active.
pub async fn select_entity(
    state: &AppState,
    session: Option<&Session>,
    input: SelectEntityInput,
) -> ActionResult<User> {
    let session = check_auth(session, None)?;

    if !session.user.belongs_to(input.entity_id) {
        return Err(ActionError::Forbidden(format!(
            "entity {} is not assigned to the user",
            input.entity_id
        )));
    }
    let entity = state.directory.require_entity(input.entity_id).await?;
    if !entity.active {
        return Err(ActionError::Forbidden(format!("entity {} is disabled", entity.id)));
    }

    let mut user = state.directory.require_user(session.user_id()).await?;
    user.selected_entity_id = Some(entity.id);
    user.updated_at = Utc::now();
    state.directory.save_user(&user).await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::Harness;
    use orgadmin_auth::permissions::{CATALOG, LOG_VIEW};

    #[tokio::test]
    async fn current_user_lists_effective_permissions() {
        let h = Harness::new().await;
        let admin = h.admin().await;
        let me = get_current_user(&h.state, Some(&admin)).await.unwrap();
        assert_eq!(me.permissions.len(), CATALOG.len());
        assert_eq!(me.entities.len(), 2);

        let viewer = h.user_with(&[LOG_VIEW]).await;
        let me = get_current_user(&h.state, Some(&viewer)).await.unwrap();
        assert_eq!(me.permissions, vec![LOG_VIEW]);
    }

    #[tokio::test]
    async fn select_entity_checks_membership_and_active_flag() {
        let h = Harness::new().await;
        let caller = h.user_with(&[]).await;
        let second = h.seed.entity_ids[1];

        let user = select_entity(&h.state, Some(&caller), SelectEntityInput { entity_id: second })
            .await
            .unwrap();
        assert_eq!(user.selected_entity_id, Some(second));

        let err = select_entity(
            &h.state,
            Some(&caller),
            SelectEntityInput {
                entity_id: EntityId::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::Forbidden(_)));

        let mut entity = h.state.directory.require_entity(second).await.unwrap();
        entity.active = false;
        h.state.directory.save_entity(&entity).await.unwrap();
        let err = select_entity(&h.state, Some(&caller), SelectEntityInput { entity_id: second })
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Forbidden(_)));
    }
}
