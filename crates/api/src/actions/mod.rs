//! Permission-checked actions.
//!
//! Every action follows the same order: validate the input, run
//! [`check_auth`](orgadmin_auth::check_auth) with the action's permission,
//! apply policy, mutate, then hand an entry to the audit writer. Handlers
//! turn an [`ActionError`] into a generic per-action failure message.

use thiserror::Error;

use orgadmin_auth::AuthError;
use orgadmin_core::{DomainError, ValidationErrors};
use orgadmin_infra::StoreError;

pub mod entities;
pub mod logs;
pub mod me;
pub mod permissions;
pub mod roles;
pub mod users;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ActionError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DomainError> for ActionError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(errors) => Self::Validation(errors),
            DomainError::InvalidId(msg) => Self::Validation(ValidationErrors::single("id", msg)),
            DomainError::NotFound(what) => Self::NotFound(what),
            DomainError::Forbidden(msg) => Self::Forbidden(msg),
        }
    }
}

impl From<StoreError> for ActionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

pub type ActionResult<T> = Result<T, ActionError>;

/// Drop repeated ids, keeping first-seen order.
pub(crate) fn dedup<T: PartialEq + Copy>(ids: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the action tests.

    use std::sync::Arc;

    use chrono::Utc;
    use orgadmin_auth::{Permission, PermissionSet, Role, Session, User};
    use orgadmin_core::{RoleId, UserId};
    use orgadmin_infra::{
        AuditLogger, AuditStore, DirectoryStore, InMemoryAuditStore, InMemoryDirectory, SeedReport,
        seed,
    };

    use crate::config::AppConfig;
    use crate::context::AppState;

    pub struct Harness {
        pub state: AppState,
        pub audit_store: Arc<InMemoryAuditStore>,
        pub seed: SeedReport,
    }

    impl Harness {
        pub async fn new() -> Self {
            let directory = Arc::new(InMemoryDirectory::new());
            let seed = seed(directory.as_ref()).await.unwrap();
            let audit_store = Arc::new(InMemoryAuditStore::new());
            let (audit, _join) = AuditLogger::spawn(audit_store.clone());
            let config = AppConfig::from_lookup(|key| match key {
                "SESSION_SECRET" => Some("session".to_string()),
                "CRON_SECRET" => Some("cron".to_string()),
                _ => None,
            })
            .unwrap();
            let state = AppState::new(config, directory, audit_store.clone(), audit);
            Self {
                state,
                audit_store,
                seed,
            }
        }

        /// Session of the seeded Super Admin.
        pub async fn admin(&self) -> Session {
            self.session_of(self.seed.user_id).await
        }

        pub async fn session_of(&self, id: UserId) -> Session {
            let user = self.state.directory.require_user(id).await.unwrap();
            let roles = self.state.directory.roles_of(&user).await.unwrap();
            Session::new(user, PermissionSet::from_roles(roles.iter()))
        }

        /// A plain active user in every seeded entity holding exactly `perms`.
        pub async fn user_with(&self, perms: &[Permission]) -> Session {
            let role = Role {
                id: RoleId::new(),
                name: format!("role-{}", RoleId::new()),
                description: String::new(),
                is_system_managed: false,
                permissions: perms.to_vec(),
            };
            self.state.directory.save_role(&role).await.unwrap();

            let user = User {
                id: UserId::new(),
                name: "Operator".to_string(),
                email: format!("op-{}@example.com", UserId::new()),
                email_verified: true,
                active: true,
                is_system_managed: false,
                role_ids: vec![role.id],
                entity_ids: self.seed.entity_ids.clone(),
                selected_entity_id: self.seed.entity_ids.first().copied(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.state.directory.save_user(&user).await.unwrap();
            self.session_of(user.id).await
        }

        pub async fn log_types(&self) -> Vec<&'static str> {
            self.state.audit.flush().await.unwrap();
            let filter = orgadmin_audit::LogFilter::new(
                self.seed.entity_ids.clone(),
                Utc::now() - chrono::Duration::hours(1),
                None,
            );
            self.audit_store
                .list(&filter)
                .await
                .unwrap()
                .into_iter()
                .map(|e| e.action.action_type().as_str())
                .collect()
        }
    }
}
