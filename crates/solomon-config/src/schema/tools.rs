//! Scope handed to the assistant's tools: clusters, cloud role, repositories.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolAccessConfig {
    pub kubectl: KubectlConfig,
    pub aws: AwsConfig,
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlConfig {
    pub contexts: Vec<String>,
    pub namespaces: Vec<String>,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            contexts: vec!["prod".into(), "staging".into(), "dev".into()],
            namespaces: vec!["cobalt-services".into(), "monitoring".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub role: String,
    pub regions: Vec<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            role: "SolomonAgentRole".into(),
            regions: vec!["us-east-1".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub repos: Vec<String>,
    pub permissions: Vec<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            repos: vec!["cobalt/*".into()],
            permissions: vec!["read".into(), "write:pr".into()],
        }
    }
}
