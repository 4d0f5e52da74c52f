use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgadmin_core::EntityId;

/// Organizational entity: the tenancy/visibility scope for users and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
