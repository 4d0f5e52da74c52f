//! Demo data reset, run by the cron endpoint.

use tracing::{info, instrument};

use crate::store::ResetCounts;
use crate::{AuditStore, DirectoryStore, StoreError};

/// Delete every user and role that is not system-managed, then empty the log.
#[instrument(skip_all, err)]
pub async fn reset(
    directory: &dyn DirectoryStore,
    audit: &dyn AuditStore,
) -> Result<ResetCounts, StoreError> {
    let mut counts = directory.delete_unmanaged().await?;
    counts.logs = audit.clear().await?;
    info!(
        users = counts.users,
        roles = counts.roles,
        logs = counts.logs,
        "demo data reset"
    );
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed;
    use crate::store::{InMemoryAuditStore, InMemoryDirectory};
    use chrono::{Duration, Utc};
    use orgadmin_audit::{LogAction, LogFilter, NewLogEntry, SubjectRef};
    use orgadmin_auth::{Role, User};
    use orgadmin_core::{RoleId, UserId};

    #[tokio::test]
    async fn keeps_only_system_managed_records() {
        let directory = InMemoryDirectory::new();
        let audit = InMemoryAuditStore::new();
        let report = seed(&directory).await.unwrap();

        let editors = Role {
            id: RoleId::new(),
            name: "Editors".to_string(),
            description: String::new(),
            is_system_managed: false,
            permissions: vec![],
        };
        directory.save_role(&editors).await.unwrap();

        let admin = directory.require_user(report.user_id).await.unwrap();
        let bob = User {
            id: UserId::new(),
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            is_system_managed: false,
            role_ids: vec![editors.id],
            ..admin.clone()
        };
        directory.save_user(&bob).await.unwrap();

        let mut admin = admin;
        admin.role_ids.push(editors.id);
        directory.save_user(&admin).await.unwrap();

        audit
            .append(
                NewLogEntry::new(
                    LogAction::UserCreate {
                        user: SubjectRef::new(bob.id, "Bob"),
                    },
                    admin.id,
                    None,
                    Utc::now(),
                )
                .unwrap(),
            )
            .await
            .unwrap();

        let counts = reset(&directory, &audit).await.unwrap();
        assert_eq!(counts, ResetCounts { users: 1, roles: 1, logs: 1 });

        let users = directory.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, report.user_id);
        assert_eq!(users[0].role_ids, vec![report.role_id]);

        let roles = directory.list_roles().await.unwrap();
        assert_eq!(roles.len(), 1);
        assert!(roles[0].is_system_managed);

        let filter = LogFilter::new(vec![], Utc::now() - Duration::hours(1), None);
        assert!(audit.list(&filter).await.unwrap().is_empty());
    }
}
