use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Risk tier of a tool. Roles are granted every tool up to a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolTier {
    /// Read-only queries.
    Read,
    /// Reversible mutations (scaling, restarts, pull requests).
    Mutate,
    /// Deploys, rollbacks, secret writes, exec into pods.
    Privileged,
}

impl fmt::Display for ToolTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolTier::Read => "read",
            ToolTier::Mutate => "mutate",
            ToolTier::Privileged => "privileged",
        };
        f.write_str(s)
    }
}

impl FromStr for ToolTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(ToolTier::Read),
            "mutate" => Ok(ToolTier::Mutate),
            "privileged" => Ok(ToolTier::Privileged),
            other => Err(format!("unknown tool tier '{other}'")),
        }
    }
}
