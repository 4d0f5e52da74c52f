//! User administration.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use orgadmin_auth::permissions::{USER_CREATE, USER_DELETE, USER_DISABLE, USER_EDIT};
use orgadmin_auth::policy::{ensure_user_deletable, ensure_user_mutable, ensure_user_toggleable};
use orgadmin_auth::{Session, User, UserDetails, check_auth};
use orgadmin_core::validation::email;
use orgadmin_core::{EntityId, RoleId, TextRule, UserId, ValidationErrors};
use orgadmin_infra::DirectoryStore;

use super::{ActionResult, dedup};
use crate::context::AppState;

const NAME: TextRule = TextRule::new("Name", 2, 64);

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
    #[serde(default)]
    pub entity_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserInput {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignRolesInput {
    pub user_id: UserId,
    pub role_ids: Vec<RoleId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignEntitiesInput {
    pub user_id: UserId,
    pub entity_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetUserActiveInput {
    pub user_id: UserId,
    pub active: bool,
}

fn name_and_email(name: &str, address: &str) -> Result<(String, String), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = NAME.apply("name", name, &mut errors);
    let address = email("email", address, &mut errors);
    match (name, address) {
        (Some(name), Some(address)) => errors.finish((name, address)),
        _ => Err(errors),
    }
}

/// Every user with roles and entities resolved.
pub async fn get_users(state: &AppState, session: Option<&Session>) -> ActionResult<Vec<UserDetails>> {
    check_auth(session, None)?;
    Ok(state.directory.list_user_details().await?)
}

pub async fn create_user(
    state: &AppState,
    session: Option<&Session>,
    input: CreateUserInput,
) -> ActionResult<User> {
    let (name, address) = name_and_email(&input.name, &input.email)?;
    let session = check_auth(session, Some(&USER_CREATE))?;

    let role_ids = dedup(input.role_ids);
    let entity_ids = dedup(input.entity_ids);
    for id in &role_ids {
        state.directory.require_role(*id).await?;
    }
    for id in &entity_ids {
        state.directory.require_entity(*id).await?;
    }

    let now = Utc::now();
    let user = User {
        id: UserId::new(),
        name,
        email: address,
        email_verified: false,
        active: true,
        is_system_managed: false,
        selected_entity_id: entity_ids.first().copied(),
        role_ids,
        entity_ids,
        created_at: now,
        updated_at: now,
    };
    state.directory.save_user(&user).await?;

    info!(user_id = %user.id, actor = %session.user_id(), "user created");
    state.audit.scope(Some(session)).user_create(&user);
    Ok(user)
}

pub async fn update_user(
    state: &AppState,
    session: Option<&Session>,
    id: UserId,
    input: UpdateUserInput,
) -> ActionResult<User> {
    let (name, address) = name_and_email(&input.name, &input.email)?;
    let session = check_auth(session, Some(&USER_EDIT))?;

    let mut user = state.directory.require_user(id).await?;
    ensure_user_mutable(&user)?;
    if user.email != address {
        // A changed address has not been verified.
        user.email_verified = false;
    }
    user.name = name;
    user.email = address;
    user.updated_at = Utc::now();
    state.directory.save_user(&user).await?;

    state.audit.scope(Some(session)).user_update(&user);
    Ok(user)
}

pub async fn delete_user(
    state: &AppState,
    session: Option<&Session>,
    id: UserId,
) -> ActionResult<User> {
    let session = check_auth(session, Some(&USER_DELETE))?;

    let user = state.directory.require_user(id).await?;
    ensure_user_deletable(session.user_id(), &user)?;
    state.directory.delete_user(id).await?;

    info!(user_id = %user.id, actor = %session.user_id(), "user deleted");
    state.audit.scope(Some(session)).user_delete(&user);
    Ok(user)
}

/// Replace the role set of a user.
pub async fn assign_roles_to_user(
    state: &AppState,
    session: Option<&Session>,
    input: AssignRolesInput,
) -> ActionResult<User> {
    let session = check_auth(session, Some(&USER_EDIT))?;

    let mut user = state.directory.require_user(input.user_id).await?;
    ensure_user_mutable(&user)?;

    let role_ids = dedup(input.role_ids);
    for id in &role_ids {
        state.directory.require_role(*id).await?;
    }
    user.role_ids = role_ids;
    user.updated_at = Utc::now();
    state.directory.save_user(&user).await?;

    state.audit.scope(Some(session)).user_set_role(&user);
    Ok(user)
}

/// Replace the entity set of a user.
///
/// A selected entity that is no longer assigned moves to the first one left.
pub async fn assign_entities_to_user(
    state: &AppState,
    session: Option<&Session>,
    input: AssignEntitiesInput,
) -> ActionResult<User> {
    let session = check_auth(session, Some(&USER_EDIT))?;

    let mut user = state.directory.require_user(input.user_id).await?;
    ensure_user_mutable(&user)?;

    let entity_ids = dedup(input.entity_ids);
    for id in &entity_ids {
        state.directory.require_entity(*id).await?;
    }
    if !user
        .selected_entity_id
        .is_some_and(|selected| entity_ids.contains(&selected))
    {
        user.selected_entity_id = entity_ids.first().copied();
    }
    user.entity_ids = entity_ids;
    user.updated_at = Utc::now();
    state.directory.save_user(&user).await?;

    state.audit.scope(Some(session)).user_set_entity(&user);
    Ok(user)
}

/// Enable or disable a user. Disabling invalidates every session of the user.
pub async fn set_user_active(
    state: &AppState,
    session: Option<&Session>,
    input: SetUserActiveInput,
) -> ActionResult<User> {
    let session = check_auth(session, Some(&USER_DISABLE))?;

    let mut user = state.directory.require_user(input.user_id).await?;
    ensure_user_toggleable(session.user_id(), &user)?;

    user.active = input.active;
    user.updated_at = Utc::now();
    state.directory.save_user(&user).await?;

    let audit = state.audit.scope(Some(session));
    if user.active {
        audit.user_enable(&user);
    } else {
        info!(user_id = %user.id, actor = %session.user_id(), "user disabled");
        audit.user_disable(&user);
    }
    Ok(user)
}

pub async fn mark_user_email_verified(
    state: &AppState,
    session: Option<&Session>,
    user_id: UserId,
) -> ActionResult<User> {
    let session = check_auth(session, Some(&USER_EDIT))?;

    let mut user = state.directory.require_user(user_id).await?;
    ensure_user_mutable(&user)?;
    user.email_verified = true;
    user.updated_at = Utc::now();
    state.directory.save_user(&user).await?;

    state.audit.scope(Some(session)).user_email_verified(&user);
    Ok(user)
}
