use chrono::{DateTime, Utc};
use serde::Serialize;

use orgadmin_core::{EntityId, LogId, UserId};

use crate::{AuditError, LogAction, LogScope, SubjectRef};

/// A log record that has not been persisted yet.
///
/// Construction enforces the scoping rule: entity-scoped actions carry an
/// entity id, every other action carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    action: LogAction,
    user_id: UserId,
    entity_id: Option<EntityId>,
    occurred_at: DateTime<Utc>,
}

impl NewLogEntry {
    pub fn new(
        action: LogAction,
        user_id: UserId,
        entity_id: Option<EntityId>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Self, AuditError> {
        let action_type = action.action_type();
        match (action.scope(), entity_id) {
            (LogScope::Entity, None) => return Err(AuditError::MissingEntity(action_type.as_str())),
            (LogScope::Global, Some(_)) => {
                return Err(AuditError::UnexpectedEntity(action_type.as_str()));
            }
            _ => {}
        }
        Ok(Self {
            action,
            user_id,
            entity_id,
            occurred_at,
        })
    }

    pub fn action(&self) -> &LogAction {
        &self.action
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        self.entity_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Assign the persisted identity.
    pub fn into_entry(self, id: LogId) -> LogEntry {
        LogEntry {
            id,
            action: self.action,
            user_id: self.user_id,
            entity_id: self.entity_id,
            action_date: self.occurred_at,
        }
    }
}

/// A persisted, immutable log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: LogId,
    pub action: LogAction,
    pub user_id: UserId,
    pub entity_id: Option<EntityId>,
    pub action_date: DateTime<Utc>,
}

/// Visibility + date-range filter for log queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub entity_ids: Vec<EntityId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LogFilter {
    /// `end` defaults to now.
    pub fn new(entity_ids: Vec<EntityId>, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            entity_ids,
            start,
            end: end.unwrap_or_else(Utc::now),
        }
    }

    /// Visible (entity in the set, or a global entry) and inside `[start, end]`.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let visible = match entry.entity_id {
            None => true,
            Some(id) => self.entity_ids.contains(&id),
        };
        visible && entry.action_date >= self.start && entry.action_date <= self.end
    }
}

/// A log entry joined with the names of its actor and entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogView {
    pub id: LogId,
    pub action_type: &'static str,
    pub action_detail: serde_json::Value,
    pub summary: String,
    pub user_id: UserId,
    pub entity_id: Option<EntityId>,
    pub action_date: DateTime<Utc>,
    pub user: SubjectRef,
    pub entity: Option<SubjectRef>,
}

impl LogView {
    pub fn new(entry: LogEntry, user: SubjectRef, entity: Option<SubjectRef>) -> Self {
        Self {
            id: entry.id,
            action_type: entry.action.action_type().as_str(),
            action_detail: entry.action.detail(),
            summary: entry.action.summary(),
            user_id: entry.user_id,
            entity_id: entry.entity_id,
            action_date: entry.action_date,
            user,
            entity,
        }
    }
}
