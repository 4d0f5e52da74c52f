//! Entity administration.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use orgadmin_auth::permissions::{ENTITY_CREATE, ENTITY_DISABLE, ENTITY_EDIT};
use orgadmin_auth::{Entity, Session, check_auth};
use orgadmin_core::{EntityId, TextRule, ValidationErrors};
use orgadmin_infra::DirectoryStore;

use super::ActionResult;
use crate::context::AppState;

const NAME: TextRule = TextRule::new("Name", 2, 64);

#[derive(Debug, Clone, Deserialize)]
pub struct EntityInput {
    pub name: String,
}

impl EntityInput {
    fn validate(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match NAME.apply("name", &self.name, &mut errors) {
            Some(name) => errors.finish(name),
            None => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetEntityActiveInput {
    pub entity_id: EntityId,
    pub active: bool,
}

pub async fn get_entities(state: &AppState, session: Option<&Session>) -> ActionResult<Vec<Entity>> {
    check_auth(session, None)?;
    Ok(state.directory.list_entities().await?)
}

pub async fn create_entity(
    state: &AppState,
    session: Option<&Session>,
    input: EntityInput,
) -> ActionResult<Entity> {
    let name = input.validate()?;
    let session = check_auth(session, Some(&ENTITY_CREATE))?;

    let now = Utc::now();
    let entity = Entity {
        id: EntityId::new(),
        name,
        active: true,
        created_at: now,
        updated_at: now,
    };
    state.directory.save_entity(&entity).await?;

    info!(entity_id = %entity.id, actor = %session.user_id(), "entity created");
    state.audit.scope(Some(session)).entity_create(&entity);
    Ok(entity)
}

pub async fn update_entity(
    state: &AppState,
    session: Option<&Session>,
    id: EntityId,
    input: EntityInput,
) -> ActionResult<Entity> {
    let name = input.validate()?;
    let session = check_auth(session, Some(&ENTITY_EDIT))?;

    let mut entity = state.directory.require_entity(id).await?;
    entity.name = name;
    entity.updated_at = Utc::now();
    state.directory.save_entity(&entity).await?;

    state.audit.scope(Some(session)).entity_update(&entity);
    Ok(entity)
}

pub async fn set_entity_active(
    state: &AppState,
    session: Option<&Session>,
    input: SetEntityActiveInput,
) -> ActionResult<Entity> {
    let session = check_auth(session, Some(&ENTITY_DISABLE))?;

    let mut entity = state.directory.require_entity(input.entity_id).await?;
    entity.active = input.active;
    entity.updated_at = Utc::now();
    state.directory.save_entity(&entity).await?;

    let audit = state.audit.scope(Some(session));
    if entity.active {
        audit.entity_enable(&entity);
    } else {
        audit.entity_disable(&entity);
    }
    Ok(entity)
}
