//! In-memory stores for tests/dev.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use orgadmin_audit::{LogEntry, LogFilter, NewLogEntry};
use orgadmin_auth::{Entity, Permission, Role, User};
use orgadmin_core::{EntityId, LogId, RoleId, UserId};

use super::{AuditStore, DirectoryStore, ResetCounts, StoreError};

#[derive(Debug, Default)]
struct Tables {
    permissions: BTreeSet<Permission>,
    roles: HashMap<RoleId, Role>,
    users: HashMap<UserId, User>,
    entities: HashMap<EntityId, Entity>,
}

/// In-memory directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Tables>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Database("directory lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Database("directory lock poisoned".to_string()))
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        Ok(self.read()?.permissions.iter().cloned().collect())
    }

    async fn save_permission(&self, permission: &Permission) -> Result<(), StoreError> {
        self.write()?.permissions.insert(permission.clone());
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let mut roles: Vec<Role> = self.read()?.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(roles)
    }

    async fn get_role(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        Ok(self.read()?.roles.get(&id).cloned())
    }

    async fn save_role(&self, role: &Role) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if let Some(unknown) = role
            .permissions
            .iter()
            .find(|p| !tables.permissions.contains(*p))
        {
            return Err(StoreError::not_found(format!("permission {unknown}")));
        }
        let mut stored = role.clone();
        stored.permissions.sort();
        tables.roles.insert(role.id, stored);
        Ok(())
    }

    async fn delete_role(&self, id: RoleId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.roles.remove(&id).is_none() {
            return Err(StoreError::not_found(format!("role {id}")));
        }
        for user in tables.users.values_mut() {
            user.role_ids.retain(|r| *r != id);
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let normalized = email.trim().to_lowercase();
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == normalized)
            .cloned())
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::Conflict(format!("email {} already in use", user.email)));
        }
        if let Some(missing) = user.role_ids.iter().find(|r| !tables.roles.contains_key(*r)) {
            return Err(StoreError::not_found(format!("role {missing}")));
        }
        if let Some(missing) = user
            .entity_ids
            .iter()
            .find(|e| !tables.entities.contains_key(*e))
        {
            return Err(StoreError::not_found(format!("entity {missing}")));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        match self.write()?.users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(format!("user {id}"))),
        }
    }

    async fn list_entities(&self) -> Result<Vec<Entity>, StoreError> {
        let mut entities: Vec<Entity> = self.read()?.entities.values().cloned().collect();
        entities.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(entities)
    }

    async fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, StoreError> {
        Ok(self.read()?.entities.get(&id).cloned())
    }

    async fn save_entity(&self, entity: &Entity) -> Result<(), StoreError> {
        self.write()?.entities.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn delete_unmanaged(&self) -> Result<ResetCounts, StoreError> {
        let mut tables = self.write()?;

        let users_before = tables.users.len();
        tables.users.retain(|_, u| u.is_system_managed);
        let roles_before = tables.roles.len();
        tables.roles.retain(|_, r| r.is_system_managed);

        let remaining: Vec<RoleId> = tables.roles.keys().copied().collect();
        for user in tables.users.values_mut() {
            user.role_ids.retain(|r| remaining.contains(r));
        }

        Ok(ResetCounts {
            users: (users_before - tables.users.len()) as u64,
            roles: (roles_before - tables.roles.len()) as u64,
            logs: 0,
        })
    }
}

/// In-memory append-only log.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<LogEntry>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, entry: NewLogEntry) -> Result<LogEntry, StoreError> {
        let stored = entry.into_entry(LogId::new());
        self.entries
            .write()
            .map_err(|_| StoreError::Database("audit lock poisoned".to_string()))?
            .push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Database("audit lock poisoned".to_string()))?;

        let mut matching: Vec<LogEntry> = entries.iter().filter(|e| filter.matches(e)).cloned().collect();
        matching.sort_by(|a, b| b.action_date.cmp(&a.action_date).then(b.id.cmp(&a.id)));
        Ok(matching)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Database("audit lock poisoned".to_string()))?;
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use orgadmin_audit::{LogAction, SubjectRef};
    use orgadmin_auth::permissions::{CATALOG, ROLE_CREATE, ROLE_EDIT};

    fn role(name: &str, perms: Vec<Permission>) -> Role {
        Role {
            id: RoleId::new(),
            name: name.to_string(),
            description: String::new(),
            is_system_managed: false,
            permissions: perms,
        }
    }

    fn user(email: &str, roles: Vec<RoleId>) -> User {
        User {
            id: UserId::new(),
            name: "User".to_string(),
            email: email.to_string(),
            email_verified: false,
            active: true,
            is_system_managed: false,
            role_ids: roles,
            entity_ids: vec![],
            selected_entity_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn seeded() -> InMemoryDirectory {
        let dir = InMemoryDirectory::new();
        for p in CATALOG {
            dir.save_permission(p).await.unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn role_permissions_read_back_exactly() {
        let dir = seeded().await;
        let mut r = role("Editors", vec![]);
        dir.save_role(&r).await.unwrap();

        r.permissions = vec![ROLE_EDIT, ROLE_CREATE];
        dir.save_role(&r).await.unwrap();

        let back = dir.require_role(r.id).await.unwrap();
        assert_eq!(back.permission_codes(), vec!["role_create", "role_edit"]);
    }

    #[tokio::test]
    async fn unknown_permission_is_rejected() {
        let dir = seeded().await;
        let r = role("Odd", vec![Permission::new("fly")]);
        assert!(matches!(dir.save_role(&r).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let dir = seeded().await;
        dir.save_user(&user("a@example.com", vec![])).await.unwrap();
        let err = dir.save_user(&user("a@example.com", vec![])).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_role_detaches_it_from_users() {
        let dir = seeded().await;
        let r = role("Temp", vec![]);
        dir.save_role(&r).await.unwrap();
        let u = user("b@example.com", vec![r.id]);
        dir.save_user(&u).await.unwrap();

        dir.delete_role(r.id).await.unwrap();
        assert!(dir.require_user(u.id).await.unwrap().role_ids.is_empty());
    }

    #[tokio::test]
    async fn audit_list_is_newest_first_and_filtered() {
        let store = InMemoryAuditStore::new();
        let now = Utc::now();
        let e1 = EntityId::new();
        let e2 = EntityId::new();
        let actor = UserId::new();

        let entity_action = |name: &str| LogAction::EntityUpdate {
            entity: SubjectRef::new("x", name),
        };

        for (action, entity, at) in [
            (entity_action("old"), Some(e1), now - Duration::minutes(10)),
            (entity_action("other"), Some(e2), now - Duration::minutes(5)),
            (
                LogAction::RoleCreate { role: SubjectRef::new("r", "R") },
                None,
                now - Duration::minutes(1),
            ),
            (entity_action("new"), Some(e1), now),
        ] {
            store
                .append(NewLogEntry::new(action, actor, entity, at).unwrap())
                .await
                .unwrap();
        }

        let filter = LogFilter::new(vec![e1], now - Duration::hours(1), Some(now));
        let got = store.list(&filter).await.unwrap();

        assert_eq!(got.len(), 3);
        assert!(got.windows(2).all(|w| w[0].action_date >= w[1].action_date));
        assert!(got.iter().all(|e| e.entity_id.is_none() || e.entity_id == Some(e1)));

        assert_eq!(store.clear().await.unwrap(), 4);
        assert!(store.is_empty());
    }
}
