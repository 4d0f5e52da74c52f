//! Postgres-backed directory and audit log.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | Database (other) | Any other | `Database` |
//! | RowNotFound | N/A | `NotFound` |
//! | Other | N/A | `Database` |
//!
//! Users and roles are saved in one transaction together with their join
//! rows, so a reader never sees a user with half of its roles.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{info, instrument};
use uuid::Uuid;

use orgadmin_audit::{LogAction, LogEntry, LogFilter, NewLogEntry};
use orgadmin_auth::{Entity, Permission, Role, User};
use orgadmin_core::{EntityId, LogId, RoleId, UserId};

use super::{AuditStore, DirectoryStore, ResetCounts, StoreError};

/// Apply the bundled schema migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    info!("running migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(format!("migration failed: {e}")))
}

const SELECT_ROLES: &str = r#"
    SELECT
        r.id,
        r.name,
        r.description,
        r.is_system_managed,
        ARRAY(
            SELECT rp.permission_code FROM role_permissions rp
            WHERE rp.role_id = r.id
            ORDER BY rp.permission_code COLLATE "C"
        ) AS permissions
    FROM roles r
"#;

const SELECT_USERS: &str = r#"
    SELECT
        u.id,
        u.name,
        u.email,
        u.email_verified,
        u.active,
        u.is_system_managed,
        u.selected_entity_id,
        u.created_at,
        u.updated_at,
        ARRAY(
            SELECT ur.role_id FROM user_roles ur
            WHERE ur.user_id = u.id
            ORDER BY ur.position
        ) AS role_ids,
        ARRAY(
            SELECT ue.entity_id FROM user_entities ue
            WHERE ue.user_id = u.id
            ORDER BY ue.position
        ) AS entity_ids
    FROM users u
"#;

const SELECT_ENTITIES: &str = "SELECT id, name, active, created_at, updated_at FROM entities";

/// Postgres-backed [`DirectoryStore`].
#[derive(Debug, Clone)]
pub struct PostgresDirectory {
    pool: Arc<PgPool>,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl DirectoryStore for PostgresDirectory {
    #[instrument(skip(self), err)]
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        let rows = sqlx::query("SELECT code FROM permissions ORDER BY code COLLATE \"C\"")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_permissions", e))?;

        rows.iter()
            .map(|row| {
                let code: String = get(row, "code")?;
                Ok(Permission::new(code))
            })
            .collect()
    }

    #[instrument(skip(self), fields(code = %permission), err)]
    async fn save_permission(&self, permission: &Permission) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO permissions (code) VALUES ($1) ON CONFLICT (code) DO NOTHING")
            .bind(permission.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("save_permission", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_ROLES} ORDER BY r.name, r.id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_roles", e))?;
        rows.iter().map(role_from_row).collect()
    }

    #[instrument(skip(self), fields(role_id = %id), err)]
    async fn get_role(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_ROLES} WHERE r.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_role", e))?;
        row.as_ref().map(role_from_row).transpose()
    }

    #[instrument(skip(self, role), fields(role_id = %role.id), err)]
    async fn save_role(&self, role: &Role) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO roles (id, name, description, is_system_managed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                is_system_managed = EXCLUDED.is_system_managed
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.is_system_managed)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_role", e))?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_role_permissions", e))?;

        let codes: Vec<String> = role.permission_codes().into_iter().map(str::to_string).collect();
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_code)
            SELECT $1, code FROM UNNEST($2::text[]) AS code
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(&codes)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_role_permissions", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), fields(role_id = %id), err)]
    async fn delete_role(&self, id: RoleId) -> Result<(), StoreError> {
        // user_roles and role_permissions cascade.
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_role", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("role {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_USERS} ORDER BY u.created_at, u.id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_USERS} WHERE u.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_USERS} WHERE u.email = $1"))
            .bind(email.trim().to_lowercase())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, email_verified, active, is_system_managed,
                selected_entity_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                email_verified = EXCLUDED.email_verified,
                active = EXCLUDED.active,
                is_system_managed = EXCLUDED.is_system_managed,
                selected_entity_id = EXCLUDED.selected_entity_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.email_verified)
        .bind(user.active)
        .bind(user.is_system_managed)
        .bind(user.selected_entity_id.map(Uuid::from))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_user", e))?;

        let role_ids: Vec<Uuid> = user.role_ids.iter().map(|r| *r.as_uuid()).collect();
        let entity_ids: Vec<Uuid> = user.entity_ids.iter().map(|e| *e.as_uuid()).collect();

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_user_roles", e))?;
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id, position)
            SELECT $1, role_id, position::int
            FROM UNNEST($2::uuid[]) WITH ORDINALITY AS t(role_id, position)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&role_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user_roles", e))?;

        sqlx::query("DELETE FROM user_entities WHERE user_id = $1")
            .bind(user.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_user_entities", e))?;
        sqlx::query(
            r#"
            INSERT INTO user_entities (user_id, entity_id, position)
            SELECT $1, entity_id, position::int
            FROM UNNEST($2::uuid[]) WITH ORDINALITY AS t(entity_id, position)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&entity_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user_entities", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("user {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_entities(&self) -> Result<Vec<Entity>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_ENTITIES} ORDER BY name, id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_entities", e))?;
        rows.iter().map(entity_from_row).collect()
    }

    #[instrument(skip(self), fields(entity_id = %id), err)]
    async fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_ENTITIES} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_entity", e))?;
        row.as_ref().map(entity_from_row).transpose()
    }

    #[instrument(skip(self, entity), fields(entity_id = %entity.id), err)]
    async fn save_entity(&self, entity: &Entity) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO entities (id, name, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                active = EXCLUDED.active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(entity.id.as_uuid())
        .bind(&entity.name)
        .bind(entity.active)
        .bind(entity.created_at)
        .bind(entity.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_entity", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_unmanaged(&self) -> Result<ResetCounts, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let users = sqlx::query("DELETE FROM users WHERE is_system_managed = FALSE")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_users", e))?
            .rows_affected();
        let roles = sqlx::query("DELETE FROM roles WHERE is_system_managed = FALSE")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_roles", e))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(ResetCounts {
            users,
            roles,
            logs: 0,
        })
    }
}

/// Postgres-backed [`AuditStore`] over the `logs` table.
#[derive(Debug, Clone)]
pub struct PostgresAuditStore {
    pool: Arc<PgPool>,
}

impl PostgresAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl AuditStore for PostgresAuditStore {
    #[instrument(
        skip(self, entry),
        fields(action_type = %entry.action().action_type(), user_id = %entry.user_id()),
        err
    )]
    async fn append(&self, entry: NewLogEntry) -> Result<LogEntry, StoreError> {
        let stored = entry.into_entry(LogId::new());

        sqlx::query(
            r#"
            INSERT INTO logs (id, action_type, action_detail, user_id, entity_id, action_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(stored.id.as_uuid())
        .bind(stored.action.action_type().as_str())
        .bind(stored.action.detail())
        .bind(stored.user_id.as_uuid())
        .bind(stored.entity_id.map(Uuid::from))
        .bind(stored.action_date)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_log", e))?;

        Ok(stored)
    }

    #[instrument(skip(self, filter), fields(entities = filter.entity_ids.len()), err)]
    async fn list(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, StoreError> {
        let entity_ids: Vec<Uuid> = filter.entity_ids.iter().map(|e| *e.as_uuid()).collect();

        let rows = sqlx::query(
            r#"
            SELECT id, action_type, action_detail, user_id, entity_id, action_date
            FROM logs
            WHERE (entity_id = ANY($1) OR entity_id IS NULL)
              AND action_date >= $2
              AND action_date <= $3
            ORDER BY action_date DESC, id DESC
            "#,
        )
        .bind(&entity_ids)
        .bind(filter.start)
        .bind(filter.end)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_logs", e))?;

        rows.iter().map(log_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn clear(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM logs")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear_logs", e))?;
        Ok(result.rows_affected())
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Corrupt(format!("failed to read {column}: {e}")))
}

fn role_from_row(row: &PgRow) -> Result<Role, StoreError> {
    let permissions: Vec<String> = get(row, "permissions")?;
    Ok(Role {
        id: RoleId::from_uuid(get(row, "id")?),
        name: get(row, "name")?,
        description: get(row, "description")?,
        is_system_managed: get(row, "is_system_managed")?,
        permissions: permissions.into_iter().map(Permission::new).collect(),
    })
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role_ids: Vec<Uuid> = get(row, "role_ids")?;
    let entity_ids: Vec<Uuid> = get(row, "entity_ids")?;
    let selected: Option<Uuid> = get(row, "selected_entity_id")?;
    Ok(User {
        id: UserId::from_uuid(get(row, "id")?),
        name: get(row, "name")?,
        email: get(row, "email")?,
        email_verified: get(row, "email_verified")?,
        active: get(row, "active")?,
        is_system_managed: get(row, "is_system_managed")?,
        role_ids: role_ids.into_iter().map(RoleId::from_uuid).collect(),
        entity_ids: entity_ids.into_iter().map(EntityId::from_uuid).collect(),
        selected_entity_id: selected.map(EntityId::from_uuid),
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn entity_from_row(row: &PgRow) -> Result<Entity, StoreError> {
    Ok(Entity {
        id: EntityId::from_uuid(get(row, "id")?),
        name: get(row, "name")?,
        active: get(row, "active")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn log_from_row(row: &PgRow) -> Result<LogEntry, StoreError> {
    let action_type: String = get(row, "action_type")?;
    let detail: serde_json::Value = get(row, "action_detail")?;
    let entity_id: Option<Uuid> = get(row, "entity_id")?;
    let action_date: DateTime<Utc> = get(row, "action_date")?;

    let action = LogAction::from_parts(&action_type, detail)
        .map_err(|e| StoreError::Corrupt(format!("log row: {e}")))?;

    Ok(LogEntry {
        id: LogId::from_uuid(get(row, "id")?),
        action,
        user_id: UserId::from_uuid(get(row, "user_id")?),
        entity_id: entity_id.map(EntityId::from_uuid),
        action_date,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::NotFound(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(format!("{operation}: row not found")),
        sqlx::Error::PoolClosed => StoreError::Database(format!("{operation}: connection pool closed")),
        other => StoreError::Database(format!("{operation}: {other}")),
    }
}
