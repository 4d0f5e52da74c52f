//! The closed set of audited actions.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AuditError;

/// `{id, name}` snapshot of the record an action touched.
///
/// Names are captured at write time so the log stays readable after the
/// record is renamed or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRef {
    pub id: String,
    pub name: String,
}

impl SubjectRef {
    pub fn new(id: impl ToString, name: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.into(),
        }
    }
}

/// Whether an action is tied to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogScope {
    /// User/role administration: `entity_id` must be null.
    Global,
    /// Entity administration: `entity_id` is required.
    Entity,
}

/// One variant per audited action, each with its own payload.
///
/// The serialized form is `{"type": "<action_type>", "info": {...}}`; the
/// store persists `type` and `info` in separate columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "info", rename_all = "snake_case")]
pub enum LogAction {
    UserCreate { user: SubjectRef },
    UserUpdate { user: SubjectRef },
    UserDelete { user: SubjectRef },
    UserSetRole { user: SubjectRef },
    UserSetEntity { user: SubjectRef },
    UserDisable { user: SubjectRef },
    UserEnable { user: SubjectRef },
    UserEmailVerified { user: SubjectRef },
    RoleCreate { role: SubjectRef },
    RoleUpdate { role: SubjectRef },
    RoleDelete { role: SubjectRef },
    RoleSetPermission { role: SubjectRef },
    EntityCreate { entity: SubjectRef },
    EntityUpdate { entity: SubjectRef },
    EntityDisable { entity: SubjectRef },
    EntityEnable { entity: SubjectRef },
}

impl LogAction {
    pub fn action_type(&self) -> LogActionType {
        match self {
            LogAction::UserCreate { .. } => LogActionType::UserCreate,
            LogAction::UserUpdate { .. } => LogActionType::UserUpdate,
            LogAction::UserDelete { .. } => LogActionType::UserDelete,
            LogAction::UserSetRole { .. } => LogActionType::UserSetRole,
            LogAction::UserSetEntity { .. } => LogActionType::UserSetEntity,
            LogAction::UserDisable { .. } => LogActionType::UserDisable,
            LogAction::UserEnable { .. } => LogActionType::UserEnable,
            LogAction::UserEmailVerified { .. } => LogActionType::UserEmailVerified,
            LogAction::RoleCreate { .. } => LogActionType::RoleCreate,
            LogAction::RoleUpdate { .. } => LogActionType::RoleUpdate,
            LogAction::RoleDelete { .. } => LogActionType::RoleDelete,
            LogAction::RoleSetPermission { .. } => LogActionType::RoleSetPermission,
            LogAction::EntityCreate { .. } => LogActionType::EntityCreate,
            LogAction::EntityUpdate { .. } => LogActionType::EntityUpdate,
            LogAction::EntityDisable { .. } => LogActionType::EntityDisable,
            LogAction::EntityEnable { .. } => LogActionType::EntityEnable,
        }
    }

    pub fn scope(&self) -> LogScope {
        self.action_type().scope()
    }

    /// The record the action touched.
    pub fn subject(&self) -> &SubjectRef {
        match self {
            LogAction::UserCreate { user }
            | LogAction::UserUpdate { user }
            | LogAction::UserDelete { user }
            | LogAction::UserSetRole { user }
            | LogAction::UserSetEntity { user }
            | LogAction::UserDisable { user }
            | LogAction::UserEnable { user }
            | LogAction::UserEmailVerified { user } => user,
            LogAction::RoleCreate { role }
            | LogAction::RoleUpdate { role }
            | LogAction::RoleDelete { role }
            | LogAction::RoleSetPermission { role } => role,
            LogAction::EntityCreate { entity }
            | LogAction::EntityUpdate { entity }
            | LogAction::EntityDisable { entity }
            | LogAction::EntityEnable { entity } => entity,
        }
    }

    /// Human-readable one-liner for log listings.
    pub fn summary(&self) -> String {
        match self {
            LogAction::UserCreate { user } => format!("created user {}", user.name),
            LogAction::UserUpdate { user } => format!("updated user {}", user.name),
            LogAction::UserDelete { user } => format!("deleted user {}", user.name),
            LogAction::UserSetRole { user } => format!("changed roles of user {}", user.name),
            LogAction::UserSetEntity { user } => format!("changed entities of user {}", user.name),
            LogAction::UserDisable { user } => format!("disabled user {}", user.name),
            LogAction::UserEnable { user } => format!("enabled user {}", user.name),
            LogAction::UserEmailVerified { user } => {
                format!("verified the email of user {}", user.name)
            }
            LogAction::RoleCreate { role } => format!("created role {}", role.name),
            LogAction::RoleUpdate { role } => format!("updated role {}", role.name),
            LogAction::RoleDelete { role } => format!("deleted role {}", role.name),
            LogAction::RoleSetPermission { role } => {
                format!("changed permissions of role {}", role.name)
            }
            LogAction::EntityCreate { entity } => format!("created entity {}", entity.name),
            LogAction::EntityUpdate { entity } => format!("updated entity {}", entity.name),
            LogAction::EntityDisable { entity } => format!("disabled entity {}", entity.name),
            LogAction::EntityEnable { entity } => format!("enabled entity {}", entity.name),
        }
    }

    /// The `info` part of the serialized form (the `action_detail` column).
    pub fn detail(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("info").unwrap_or(serde_json::Value::Null)
            }
            _ => serde_json::Value::Null,
        }
    }

    /// Rebuild an action from its persisted `action_type` and `action_detail`.
    pub fn from_parts(action_type: &str, detail: serde_json::Value) -> Result<Self, AuditError> {
        let action_type: LogActionType = action_type.parse()?;
        serde_json::from_value(serde_json::json!({
            "type": action_type.as_str(),
            "info": detail,
        }))
        .map_err(|e| AuditError::Detail(e.to_string()))
    }
}

impl core::fmt::Display for LogAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Payload-free action discriminant (the `action_type` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogActionType {
    UserCreate,
    UserUpdate,
    UserDelete,
    UserSetRole,
    UserSetEntity,
    UserDisable,
    UserEnable,
    UserEmailVerified,
    RoleCreate,
    RoleUpdate,
    RoleDelete,
    RoleSetPermission,
    EntityCreate,
    EntityUpdate,
    EntityDisable,
    EntityEnable,
}

impl LogActionType {
    pub const ALL: [LogActionType; 16] = [
        LogActionType::UserCreate,
        LogActionType::UserUpdate,
        LogActionType::UserDelete,
        LogActionType::UserSetRole,
        LogActionType::UserSetEntity,
        LogActionType::UserDisable,
        LogActionType::UserEnable,
        LogActionType::UserEmailVerified,
        LogActionType::RoleCreate,
        LogActionType::RoleUpdate,
        LogActionType::RoleDelete,
        LogActionType::RoleSetPermission,
        LogActionType::EntityCreate,
        LogActionType::EntityUpdate,
        LogActionType::EntityDisable,
        LogActionType::EntityEnable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogActionType::UserCreate => "user_create",
            LogActionType::UserUpdate => "user_update",
            LogActionType::UserDelete => "user_delete",
            LogActionType::UserSetRole => "user_set_role",
            LogActionType::UserSetEntity => "user_set_entity",
            LogActionType::UserDisable => "user_disable",
            LogActionType::UserEnable => "user_enable",
            LogActionType::UserEmailVerified => "user_email_verified",
            LogActionType::RoleCreate => "role_create",
            LogActionType::RoleUpdate => "role_update",
            LogActionType::RoleDelete => "role_delete",
            LogActionType::RoleSetPermission => "role_set_permission",
            LogActionType::EntityCreate => "entity_create",
            LogActionType::EntityUpdate => "entity_update",
            LogActionType::EntityDisable => "entity_disable",
            LogActionType::EntityEnable => "entity_enable",
        }
    }

    pub fn scope(self) -> LogScope {
        match self {
            LogActionType::EntityCreate
            | LogActionType::EntityUpdate
            | LogActionType::EntityDisable
            | LogActionType::EntityEnable => LogScope::Entity,
            LogActionType::UserCreate
            | LogActionType::UserUpdate
            | LogActionType::UserDelete
            | LogActionType::UserSetRole
            | LogActionType::UserSetEntity
            | LogActionType::UserDisable
            | LogActionType::UserEnable
            | LogActionType::UserEmailVerified
            | LogActionType::RoleCreate
            | LogActionType::RoleUpdate
            | LogActionType::RoleDelete
            | LogActionType::RoleSetPermission => LogScope::Global,
        }
    }
}

impl core::fmt::Display for LogActionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogActionType {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogActionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AuditError::UnknownActionType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_the_info_payload() {
        let action = LogAction::RoleSetPermission {
            role: SubjectRef::new("r1", "Editors"),
        };
        assert_eq!(
            action.detail(),
            serde_json::json!({ "role": { "id": "r1", "name": "Editors" } })
        );
        assert_eq!(action.action_type().as_str(), "role_set_permission");
    }

    #[test]
    fn from_parts_rebuilds_the_variant() {
        let detail = serde_json::json!({ "entity": { "id": "e1", "name": "Entity 1" } });
        let action = LogAction::from_parts("entity_disable", detail).unwrap();
        assert_eq!(
            action,
            LogAction::EntityDisable {
                entity: SubjectRef::new("e1", "Entity 1")
            }
        );
    }

    #[test]
    fn from_parts_rejects_mismatched_payload() {
        let detail = serde_json::json!({ "role": { "id": "r1", "name": "x" } });
        assert!(matches!(
            LogAction::from_parts("user_create", detail),
            Err(AuditError::Detail(_))
        ));
        assert!(matches!(
            LogAction::from_parts("user_explode", serde_json::Value::Null),
            Err(AuditError::UnknownActionType(_))
        ));
    }

    #[test]
    fn only_entity_actions_are_entity_scoped() {
        for t in LogActionType::ALL {
            let expected = t.as_str().starts_with("entity_");
            assert_eq!(t.scope() == LogScope::Entity, expected, "{t}");
            assert_eq!(t.as_str().parse::<LogActionType>().unwrap(), t);
        }
    }
}
