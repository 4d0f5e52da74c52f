//! Storage boundary for the directory (users, roles, permissions, entities)
//! and the audit log.
//!
//! Two implementations exist: `in_memory` (dev/tests) and `postgres`.
//! Writes are whole-record saves; concurrent saves are last-writer-wins.

use async_trait::async_trait;
use thiserror::Error;

use orgadmin_audit::{LogEntry, LogFilter, NewLogEntry};
use orgadmin_auth::{Entity, Permission, Role, User, UserDetails};
use orgadmin_core::{EntityId, RoleId, UserId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryAuditStore, InMemoryDirectory};
pub use postgres::{PostgresAuditStore, PostgresDirectory};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

/// Counts returned by [`DirectoryStore::delete_unmanaged`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ResetCounts {
    pub users: u64,
    pub roles: u64,
    pub logs: u64,
}

/// Directory storage.
///
/// `save_*` inserts or fully replaces a record, including its relations.
/// Roles read back with their permissions sorted by code.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError>;
    async fn save_permission(&self, permission: &Permission) -> Result<(), StoreError>;

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;
    async fn get_role(&self, id: RoleId) -> Result<Option<Role>, StoreError>;
    async fn save_role(&self, role: &Role) -> Result<(), StoreError>;
    /// Also detaches the role from every user.
    async fn delete_role(&self, id: RoleId) -> Result<(), StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Fails with `Conflict` when another user already owns the e-mail.
    async fn save_user(&self, user: &User) -> Result<(), StoreError>;
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError>;

    async fn list_entities(&self) -> Result<Vec<Entity>, StoreError>;
    async fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, StoreError>;
    async fn save_entity(&self, entity: &Entity) -> Result<(), StoreError>;

    /// Delete every user and role that is not system-managed.
    async fn delete_unmanaged(&self) -> Result<ResetCounts, StoreError>;

    async fn require_role(&self, id: RoleId) -> Result<Role, StoreError> {
        self.get_role(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("role {id}")))
    }

    async fn require_user(&self, id: UserId) -> Result<User, StoreError> {
        self.get_user(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("user {id}")))
    }

    async fn require_entity(&self, id: EntityId) -> Result<Entity, StoreError> {
        self.get_entity(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("entity {id}")))
    }

    /// Roles assigned to `user`, in assignment order. Dangling ids are skipped.
    async fn roles_of(&self, user: &User) -> Result<Vec<Role>, StoreError> {
        let mut roles = Vec::with_capacity(user.role_ids.len());
        for id in &user.role_ids {
            if let Some(role) = self.get_role(*id).await? {
                roles.push(role);
            }
        }
        Ok(roles)
    }

    /// Every user with its roles and entities resolved.
    async fn list_user_details(&self) -> Result<Vec<UserDetails>, StoreError> {
        let roles = self.list_roles().await?;
        let entities = self.list_entities().await?;
        let users = self.list_users().await?;

        Ok(users
            .into_iter()
            .map(|user| UserDetails {
                roles: roles
                    .iter()
                    .filter(|r| user.role_ids.contains(&r.id))
                    .cloned()
                    .collect(),
                entities: entities
                    .iter()
                    .filter(|e| user.entity_ids.contains(&e.id))
                    .cloned()
                    .collect(),
                user,
            })
            .collect())
    }
}

/// Append-only audit log storage.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: NewLogEntry) -> Result<LogEntry, StoreError>;

    /// Matching entries, newest first. No pagination.
    async fn list(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, StoreError>;

    /// Bulk reset only. Returns the number of removed entries.
    async fn clear(&self) -> Result<u64, StoreError>;
}
