//! Log query with entity-scoped visibility.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use orgadmin_audit::{LogFilter, LogView, SubjectRef};
use orgadmin_auth::permissions::LOG_VIEW;
use orgadmin_auth::{Session, check_auth};
use orgadmin_core::ValidationErrors;
use orgadmin_infra::{AuditStore, DirectoryStore};

use super::ActionResult;
use crate::context::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct LogQuery {
    pub start: DateTime<Utc>,
    /// Defaults to now.
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

/// Entries of the caller's entities plus global entries, newest first, with
/// actor and entity names resolved. A deleted actor shows an empty name.
pub async fn get_logs(
    state: &AppState,
    session: Option<&Session>,
    query: LogQuery,
) -> ActionResult<Vec<LogView>> {
    let session = check_auth(session, Some(&LOG_VIEW))?;

    let filter = LogFilter::new(session.visible_entity_ids().to_vec(), query.start, query.end);
    if filter.end < filter.start {
        return Err(ValidationErrors::single("end", "End must not be before start").into());
    }

    let entries = state.audit_store.list(&filter).await?;

    let users: HashMap<_, _> = state
        .directory
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();
    let entities: HashMap<_, _> = state
        .directory
        .list_entities()
        .await?
        .into_iter()
        .map(|e| (e.id, e.name))
        .collect();

    Ok(entries
        .into_iter()
        .map(|entry| {
            let user = SubjectRef::new(
                entry.user_id,
                users.get(&entry.user_id).cloned().unwrap_or_default(),
            );
            let entity = entry.entity_id.map(|id| {
                SubjectRef::new(id, entities.get(&id).cloned().unwrap_or_default())
            });
            LogView::new(entry, user, entity)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionError;
    use crate::actions::entities::{SetEntityActiveInput, set_entity_active};
    use crate::actions::roles::{RoleInput, create_role};
    use crate::actions::test_support::Harness;
    use crate::actions::users::{AssignEntitiesInput, assign_entities_to_user};
    use chrono::Duration;

    fn last_hour() -> LogQuery {
        LogQuery {
            start: Utc::now() - Duration::hours(1),
            end: None,
        }
    }

    #[tokio::test]
    async fn viewer_sees_own_entities_and_global_entries() {
        let h = Harness::new().await;
        let admin = h.admin().await;
        let [first, second] = [h.seed.entity_ids[0], h.seed.entity_ids[1]];

        create_role(
            &h.state,
            Some(&admin),
            RoleInput {
                name: "Editors".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();
        for entity_id in [first, second] {
            set_entity_active(
                &h.state,
                Some(&admin),
                SetEntityActiveInput {
                    entity_id,
                    active: false,
                },
            )
            .await
            .unwrap();
        }

        let viewer = h.user_with(&[LOG_VIEW]).await;
        assign_entities_to_user(
            &h.state,
            Some(&admin),
            AssignEntitiesInput {
                user_id: viewer.user_id(),
                entity_ids: vec![first],
            },
        )
        .await
        .unwrap();
        h.state.audit.flush().await.unwrap();

        let viewer = h.session_of(viewer.user_id()).await;
        let logs = get_logs(&h.state, Some(&viewer), last_hour()).await.unwrap();

        let types: Vec<_> = logs.iter().map(|l| l.action_type).collect();
        assert_eq!(types, vec!["user_set_entity", "entity_disable", "role_create"]);
        assert!(logs.windows(2).all(|w| w[0].action_date >= w[1].action_date));
        assert!(logs.iter().all(|l| l.entity_id.is_none() || l.entity_id == Some(first)));

        let entity_entry = &logs[1];
        assert_eq!(entity_entry.entity.as_ref().unwrap().name, "Entity 1");
        assert_eq!(entity_entry.user.name, "Super Admin");
    }

    #[tokio::test]
    async fn requires_log_view() {
        let h = Harness::new().await;
        let other = h.user_with(&[]).await;
        let err = get_logs(&h.state, Some(&other), last_hour()).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let h = Harness::new().await;
        let admin = h.admin().await;
        let now = Utc::now();
        let err = get_logs(
            &h.state,
            Some(&admin),
            LogQuery {
                start: now,
                end: Some(now - Duration::minutes(1)),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
    }

    #[tokio::test]
    async fn deleted_actor_has_empty_name() {
        let h = Harness::new().await;
        let admin = h.admin().await;
        let actor = h.user_with(&[orgadmin_auth::permissions::ROLE_CREATE]).await;
        create_role(
            &h.state,
            Some(&actor),
            RoleInput {
                name: "Temp".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();
        h.state.audit.flush().await.unwrap();
        h.state.directory.delete_user(actor.user_id()).await.unwrap();

        let logs = get_logs(&h.state, Some(&admin), last_hour()).await.unwrap();
        assert_eq!(logs[0].user.id, actor.user_id().to_string());
        assert_eq!(logs[0].user.name, "");
    }
}
