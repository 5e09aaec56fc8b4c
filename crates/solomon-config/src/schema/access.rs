use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use solomon_common::ToolTier;

/// Role to tool-tier mapping. Roles missing from the table grant nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub roles: BTreeMap<String, ToolTier>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        let roles = [
            ("viewer", ToolTier::Read),
            ("operator", ToolTier::Mutate),
            ("admin", ToolTier::Privileged),
        ]
        .into_iter()
        .map(|(role, tier)| (role.to_string(), tier))
        .collect();
        Self { roles }
    }
}
