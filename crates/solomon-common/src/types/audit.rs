use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::{ActionId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    User,
    Ai,
    System,
}

/// The resource an audit entry is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: &'static str,
    pub id: String,
}

impl ResourceRef {
    pub fn session(id: &SessionId) -> Self {
        Self {
            kind: "ai_session",
            id: id.to_string(),
        }
    }

    pub fn action(id: &ActionId) -> Self {
        Self {
            kind: "ai_action",
            id: id.to_string(),
        }
    }
}

/// One line of the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor: String,
    pub actor_type: ActorType,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: impl Into<String>,
        actor_type: ActorType,
        action: impl Into<String>,
        resource: ResourceRef,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor: actor.into(),
            actor_type,
            action: action.into(),
            resource_type: resource.kind.to_string(),
            resource_id: resource.id,
            details,
            created_at: Utc::now(),
        }
    }
}
