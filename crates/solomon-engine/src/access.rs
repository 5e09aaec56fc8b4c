//! Tool grants derived from the caller's roles.
//!
//! The grant is computed once, by whoever authenticated the caller, and
//! handed to session creation. Roles the access table does not know grant
//! nothing, so a caller with no recognised role gets an empty catalog.

use serde::{Deserialize, Serialize};
use solomon_common::ToolTier;
use solomon_config::AccessConfig;

use crate::catalog::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolGrant {
    max_tier: Option<ToolTier>,
}

impl ToolGrant {
    /// A grant that allows nothing.
    pub fn none() -> Self {
        Self { max_tier: None }
    }

    /// A grant for every tool up to and including `tier`.
    pub fn up_to(tier: ToolTier) -> Self {
        Self {
            max_tier: Some(tier),
        }
    }

    /// The highest tier any of `roles` maps to in `access`.
    pub fn for_roles<S: AsRef<str>>(roles: &[S], access: &AccessConfig) -> Self {
        let max_tier = roles
            .iter()
            .filter_map(|role| access.roles.get(role.as_ref().trim()))
            .copied()
            .max();
        Self { max_tier }
    }

    pub fn max_tier(&self) -> Option<ToolTier> {
        self.max_tier
    }

    pub fn allows(&self, tool: &Tool) -> bool {
        self.max_tier.is_some_and(|max| tool.tier <= max)
    }
}
