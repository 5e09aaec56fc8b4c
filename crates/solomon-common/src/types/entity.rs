//! Catalog and incident records the engine reads through its lookup interface.
//! Only the fields the session context and system prompt use are modelled.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub repository: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: Uuid,
    pub service_id: Uuid,
    /// Environment name as used by approval policies, e.g. `prod`.
    pub name: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: String,
    pub status: String,
    #[serde(default)]
    pub affected_environments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runbook {
    pub id: Uuid,
    pub service_id: Uuid,
    pub title: String,
    pub trigger: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub automatable: bool,
}
