//! Role administration.

use serde::Deserialize;
use tracing::info;

use orgadmin_auth::permissions::{ROLE_CREATE, ROLE_DELETE, ROLE_EDIT};
use orgadmin_auth::policy::ensure_role_mutable;
use orgadmin_auth::{Permission, Role, Session, check_auth};
use orgadmin_core::{RoleId, TextRule, ValidationErrors};
use orgadmin_infra::DirectoryStore;

use super::ActionResult;
use crate::context::AppState;

const NAME: TextRule = TextRule::new("Name", 2, 64);
const DESCRIPTION: TextRule = TextRule::new("Description", 0, 255);

#[derive(Debug, Clone, Deserialize)]
pub struct RoleInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl RoleInput {
    fn validate(&self) -> Result<(String, String), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = NAME.apply("name", &self.name, &mut errors);
        let description = DESCRIPTION.apply("description", &self.description, &mut errors);
        match (name, description) {
            (Some(name), Some(description)) => errors.finish((name, description)),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignPermissionsInput {
    pub role_id: RoleId,
    pub permission_codes: Vec<String>,
}

impl AssignPermissionsInput {
    /// Known codes, de-duplicated, sorted by code.
    fn validate(&self) -> Result<Vec<Permission>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut permissions: Vec<Permission> = Vec::with_capacity(self.permission_codes.len());
        for code in &self.permission_codes {
            let permission = Permission::new(code.trim().to_string());
            if !permission.is_known() {
                errors.push("permission_codes", format!("Unknown permission: {}", code.trim()));
            } else if !permissions.contains(&permission) {
                permissions.push(permission);
            }
        }
        permissions.sort();
        errors.finish(permissions)
    }
}

/// All roles with their permissions.
pub async fn get_roles(state: &AppState, session: Option<&Session>) -> ActionResult<Vec<Role>> {
    check_auth(session, None)?;
    Ok(state.directory.list_roles().await?)
}

pub async fn create_role(
    state: &AppState,
    session: Option<&Session>,
    input: RoleInput,
) -> ActionResult<Role> {
    let (name, description) = input.validate()?;
    let session = check_auth(session, Some(&ROLE_CREATE))?;

    let role = Role {
        id: RoleId::new(),
        name,
        description,
        is_system_managed: false,
        permissions: Vec::new(),
    };
    state.directory.save_role(&role).await?;

    info!(role_id = %role.id, actor = %session.user_id(), "role created");
    state.audit.scope(Some(session)).role_create(&role);
    Ok(role)
}

pub async fn update_role(
    state: &AppState,
    session: Option<&Session>,
    id: RoleId,
    input: RoleInput,
) -> ActionResult<Role> {
    let (name, description) = input.validate()?;
    let session = check_auth(session, Some(&ROLE_EDIT))?;

    let mut role = state.directory.require_role(id).await?;
    ensure_role_mutable(&role)?;

    role.name = name;
    role.description = description;
    state.directory.save_role(&role).await?;

    state.audit.scope(Some(session)).role_update(&role);
    Ok(role)
}

pub async fn delete_role(
    state: &AppState,
    session: Option<&Session>,
    id: RoleId,
) -> ActionResult<Role> {
    let session = check_auth(session, Some(&ROLE_DELETE))?;

    let role = state.directory.require_role(id).await?;
    ensure_role_mutable(&role)?;
    state.directory.delete_role(id).await?;

    info!(role_id = %role.id, actor = %session.user_id(), "role deleted");
    state.audit.scope(Some(session)).role_delete(&role);
    Ok(role)
}

/// Replace the permission set of a role.
pub async fn assign_permissions_to_role(
    state: &AppState,
    session: Option<&Session>,
    input: AssignPermissionsInput,
) -> ActionResult<Role> {
    let permissions = input.validate()?;
    let session = check_auth(session, Some(&ROLE_EDIT))?;

    let mut role = state.directory.require_role(input.role_id).await?;
    ensure_role_mutable(&role)?;

    role.permissions = permissions;
    state.directory.save_role(&role).await?;

    state.audit.scope(Some(session)).role_set_permission(&role);
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionError;
    use crate::actions::test_support::Harness;
    use orgadmin_auth::AuthError;

    fn input(name: &str) -> RoleInput {
        RoleInput {
            name: name.to_string(),
            description: "  Can edit things  ".to_string(),
        }
    }

    #[tokio::test]
    async fn create_requires_permission_and_writes_one_log() {
        let h = Harness::new().await;

        let viewer = h.user_with(&[]).await;
        let err = create_role(&h.state, Some(&viewer), input("Editors")).await.unwrap_err();
        assert_eq!(
            err,
            ActionError::Unauthorized(AuthError::MissingPermission("role_create".to_string()))
        );
        assert!(h.log_types().await.is_empty());

        let creator = h.user_with(&[ROLE_CREATE]).await;
        let role = create_role(&h.state, Some(&creator), input("  Editors ")).await.unwrap();
        assert_eq!(role.name, "Editors");
        assert_eq!(role.description, "Can edit things");
        assert_eq!(h.log_types().await, vec!["role_create"]);
    }

    #[tokio::test]
    async fn name_bounds_are_checked_before_auth() {
        let h = Harness::new().await;
        let err = create_role(&h.state, None, input("E")).await.unwrap_err();
        let ActionError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.fields()[0].message, "Name must be at least 2 characters");

        let long = "x".repeat(65);
        assert!(matches!(
            create_role(&h.state, None, input(&long)).await,
            Err(ActionError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn assigned_permissions_read_back_exactly() {
        let h = Harness::new().await;
        let admin = h.admin().await;
        let role = create_role(&h.state, Some(&admin), input("Editors")).await.unwrap();

        let updated = assign_permissions_to_role(
            &h.state,
            Some(&admin),
            AssignPermissionsInput {
                role_id: role.id,
                permission_codes: vec![
                    "role_edit".to_string(),
                    "log_view".to_string(),
                    "role_edit".to_string(),
                ],
            },
        )
        .await
        .unwrap();

        let stored = h.state.directory.require_role(role.id).await.unwrap();
        assert_eq!(stored, updated);
        assert_eq!(stored.permission_codes(), vec!["log_view", "role_edit"]);
        assert_eq!(h.log_types().await, vec!["role_set_permission", "role_create"]);
    }

    #[tokio::test]
    async fn unknown_permission_code_is_a_validation_error() {
        let h = Harness::new().await;
        let admin = h.admin().await;
        let err = assign_permissions_to_role(
            &h.state,
            Some(&admin),
            AssignPermissionsInput {
                role_id: h.seed.role_id,
                permission_codes: vec!["launch_missiles".to_string()],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
    }

    #[tokio::test]
    async fn system_role_cannot_be_touched() {
        let h = Harness::new().await;
        let admin = h.admin().await;

        let err = update_role(&h.state, Some(&admin), h.seed.role_id, input("Renamed"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Forbidden(_)));

        let err = delete_role(&h.state, Some(&admin), h.seed.role_id).await.unwrap_err();
        assert!(matches!(err, ActionError::Forbidden(_)));

        let err = assign_permissions_to_role(
            &h.state,
            Some(&admin),
            AssignPermissionsInput {
                role_id: h.seed.role_id,
                permission_codes: vec![],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::Forbidden(_)));

        assert!(h.log_types().await.is_empty());
    }

    #[tokio::test]
    async fn delete_detaches_role() {
        let h = Harness::new().await;
        let admin = h.admin().await;
        let role = create_role(&h.state, Some(&admin), input("Temp")).await.unwrap();
        let holder = h.user_with(&[]).await;
        let mut user = holder.user.clone();
        user.role_ids.push(role.id);
        h.state.directory.save_user(&user).await.unwrap();

        delete_role(&h.state, Some(&admin), role.id).await.unwrap();

        let user = h.state.directory.require_user(user.id).await.unwrap();
        assert!(!user.role_ids.contains(&role.id));
        assert!(matches!(
            delete_role(&h.state, Some(&admin), role.id).await,
            Err(ActionError::NotFound(_))
        ));
    }
}
