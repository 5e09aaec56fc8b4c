//! Tool catalog and approval policy.
//!
//! A catalog is fixed when a session is created. Each tool says whether it
//! needs human approval and, optionally, in which environments.

use serde::{Deserialize, Serialize};
use serde_json::json;
use solomon_common::ToolTier;

use crate::access::ToolGrant;

/// A tool the assistant may ask to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub tier: ToolTier,
    pub requires_approval: bool,
    /// Environments in which approval applies. Empty means every environment.
    #[serde(default)]
    pub approval_envs: Vec<String>,
    /// JSON schema of the tool input.
    pub parameters: serde_json::Value,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, tier: ToolTier) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tier,
            requires_approval: false,
            approval_envs: Vec::new(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    /// Require approval in every environment.
    pub fn gated(mut self) -> Self {
        self.requires_approval = true;
        self.approval_envs.clear();
        self
    }

    /// Require approval only in the listed environments.
    pub fn gated_in(mut self, envs: &[&str]) -> Self {
        self.requires_approval = true;
        self.approval_envs = envs.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Whether running this tool against `environment` needs a human decision.
    ///
    /// An unknown environment counts as a match for an environment list, so a
    /// call that does not say where it runs is always gated.
    pub fn requires_approval_in(&self, environment: Option<&str>) -> bool {
        if !self.requires_approval {
            return false;
        }
        if self.approval_envs.is_empty() {
            return true;
        }
        match environment {
            Some(env) => self.approval_envs.iter().any(|e| e == env),
            None => true,
        }
    }

    /// Human-readable approval requirement, as rendered in the system prompt.
    pub fn approval_label(&self) -> String {
        if !self.requires_approval {
            "no".to_string()
        } else if self.approval_envs.is_empty() {
            "always".to_string()
        } else {
            format!("in {}", self.approval_envs.join(", "))
        }
    }
}

/// The set of tools available to one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCatalog {
    tools: Vec<Tool>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<Tool>) -> Self {
        Self { tools }
    }

    /// The operations console's built-in tools.
    pub fn builtin() -> Self {
        Self::new(builtin_tools())
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The subset of tools `grant` allows.
    pub fn granted(&self, grant: &ToolGrant) -> Self {
        Self {
            tools: self
                .tools
                .iter()
                .filter(|t| grant.allows(t))
                .cloned()
                .collect(),
        }
    }
}

fn service_params() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "service": {"type": "string"},
            "environment": {"type": "string"}
        },
        "required": ["service"]
    })
}

fn query_params(query_desc: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "service": {"type": "string"},
            "environment": {"type": "string"},
            "query": {"type": "string", "description": query_desc},
            "since": {"type": "string", "description": "Lookback window, e.g. 15m"}
        }
    })
}

fn kubectl_params() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "context": {"type": "string"},
            "namespace": {"type": "string"},
            "resource": {"type": "string"},
            "environment": {"type": "string"}
        },
        "required": ["resource"]
    })
}

/// Return the built-in tool definitions.
pub fn builtin_tools() -> Vec<Tool> {
    use ToolTier::{Mutate, Privileged, Read};

    vec![
        Tool::new("get_service", "Get service details", Read).with_parameters(service_params()),
        Tool::new("list_services", "List all services", Read),
        Tool::new("get_health", "Get service health status", Read)
            .with_parameters(service_params()),
        Tool::new("query_logs", "Query application logs", Read)
            .with_parameters(query_params("Log search expression")),
        Tool::new("query_metrics", "Query metrics (PromQL)", Read)
            .with_parameters(query_params("PromQL expression")),
        Tool::new("get_deployments", "Get deployment history", Read)
            .with_parameters(service_params()),
        Tool::new("get_incidents", "Get incident details", Read),
        Tool::new("get_costs", "Get cost information", Read),
        Tool::new("analyze_logs", "Summarize recent logs for anomalies", Read)
            .with_parameters(query_params("Optional focus for the analysis")),
        Tool::new("scale_service", "Scale service replicas", Mutate)
            .gated_in(&["prod"])
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "service": {"type": "string"},
                    "environment": {"type": "string"},
                    "replicas": {"type": "integer", "minimum": 0}
                },
                "required": ["service", "environment", "replicas"]
            })),
        Tool::new("restart_service", "Rolling restart", Mutate)
            .gated_in(&["prod"])
            .with_parameters(service_params()),
        Tool::new("create_pr", "Create GitHub pull request", Mutate).with_parameters(json!({
            "type": "object",
            "properties": {
                "repo": {"type": "string"},
                "title": {"type": "string"},
                "body": {"type": "string"},
                "branch": {"type": "string"}
            },
            "required": ["repo", "title", "branch"]
        })),
        Tool::new("deploy", "Deploy new version", Privileged)
            .gated()
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "service": {"type": "string"},
                    "environment": {"type": "string"},
                    "image_tag": {"type": "string"}
                },
                "required": ["service", "environment", "image_tag"]
            })),
        Tool::new("rollback", "Rollback to previous version", Privileged)
            .gated()
            .with_parameters(service_params()),
        Tool::new("update_secret", "Update secret value", Privileged)
            .gated()
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "environment": {"type": "string"}
                },
                "required": ["path", "environment"]
            })),
        Tool::new("kubectl_get", "kubectl get resources", Read).with_parameters(kubectl_params()),
        Tool::new("kubectl_describe", "kubectl describe resource", Read)
            .with_parameters(kubectl_params()),
        Tool::new("kubectl_logs", "kubectl logs", Read).with_parameters(kubectl_params()),
        Tool::new("kubectl_exec", "kubectl exec (debug)", Privileged)
            .gated()
            .with_parameters(kubectl_params()),
    ]
}
