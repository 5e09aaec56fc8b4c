//! Session context assembly.
//!
//! Runs once per session, before it accepts any message. Resolves the
//! target entity and its runbooks, and renders the seed system prompt.
//! Any lookup failure aborts session creation.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use solomon_common::{
    ContextKind, ContextRef, EngineError, Environment, Incident, Result, Runbook, Service,
};
use solomon_config::ToolAccessConfig;
use tracing::debug;

use crate::catalog::ToolCatalog;
use crate::lookup::EntityLookup;

const PREAMBLE: &str = "\
You are Solomon, an AI operations assistant for infrastructure and application management.
You help engineers debug issues, perform deployments, and maintain infrastructure.

## Guidelines
1. Always explain what you're about to do before doing it
2. For destructive operations, request approval through the approval flow
3. Log all actions to the audit trail
4. If you're unsure, ask clarifying questions
5. Prefer safe, reversible operations
6. For production issues, prioritize mitigation over root cause analysis
7. Be concise but thorough in your analysis
";

/// The authenticated caller a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            id: id.into(),
            roles,
        }
    }
}

/// The resolved entity a session is scoped to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TargetContext {
    Service { service: Service },
    Environment {
        environment: Environment,
        service: Service,
    },
    Incident { incident: Incident },
}

impl TargetContext {
    pub fn kind(&self) -> ContextKind {
        match self {
            TargetContext::Service { .. } => ContextKind::Service,
            TargetContext::Environment { .. } => ContextKind::Environment,
            TargetContext::Incident { .. } => ContextKind::Incident,
        }
    }

    pub fn reference(&self) -> ContextRef {
        let id = match self {
            TargetContext::Service { service } => service.id,
            TargetContext::Environment { environment, .. } => environment.id,
            TargetContext::Incident { incident } => incident.id,
        };
        ContextRef::new(self.kind(), id)
    }

    /// Environment that tool calls run against unless they name one.
    pub fn default_environment(&self) -> Option<&str> {
        match self {
            TargetContext::Environment { environment, .. } => Some(&environment.name),
            TargetContext::Incident { incident } if incident.affected_environments.len() == 1 => {
                incident.affected_environments.first().map(String::as_str)
            }
            _ => None,
        }
    }
}

/// Everything fixed at session creation. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user: UserIdentity,
    pub target: Option<TargetContext>,
    pub runbooks: Vec<Runbook>,
    pub tools: ToolAccessConfig,
    pub catalog: ToolCatalog,
}

impl SessionContext {
    pub fn default_environment(&self) -> Option<&str> {
        self.target.as_ref().and_then(TargetContext::default_environment)
    }

    /// Render the seed system message.
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::from(PREAMBLE);

        prompt.push_str("\n## Available Tools\n");
        if self.catalog.is_empty() {
            prompt.push_str("(none granted)\n");
        }
        for tool in self.catalog.tools() {
            let _ = writeln!(
                prompt,
                "- {}: {} (Approval: {})",
                tool.name,
                tool.description,
                tool.approval_label()
            );
        }

        let access = &self.tools;
        prompt.push_str("\n## Tool Access\n");
        let _ = writeln!(
            prompt,
            "kubectl contexts: {}; namespaces: {}",
            access.kubectl.contexts.join(", "),
            access.kubectl.namespaces.join(", ")
        );
        let _ = writeln!(
            prompt,
            "AWS role: {}; regions: {}",
            access.aws.role,
            access.aws.regions.join(", ")
        );
        let _ = writeln!(
            prompt,
            "GitHub repos: {}; permissions: {}",
            access.github.repos.join(", "),
            access.github.permissions.join(", ")
        );

        let _ = write!(prompt, "\n## Operator\nUser: {}", self.user.id);
        if !self.user.roles.is_empty() {
            let _ = write!(prompt, " (roles: {})", self.user.roles.join(", "));
        }
        prompt.push('\n');

        if let Some(target) = &self.target {
            prompt.push_str("\n## Current Context\n");
            match target {
                TargetContext::Service { service } => {
                    let _ = writeln!(
                        prompt,
                        "Target Service: {} ({})",
                        service.display_name, service.name
                    );
                }
                TargetContext::Environment {
                    environment,
                    service,
                } => {
                    let _ = writeln!(
                        prompt,
                        "Target Environment: {} of {} ({})",
                        environment.name, service.display_name, service.name
                    );
                    if !environment.cluster.is_empty() {
                        let _ = writeln!(
                            prompt,
                            "Cluster: {} / namespace {}",
                            environment.cluster, environment.namespace
                        );
                    }
                }
                TargetContext::Incident { incident } => {
                    let _ = writeln!(
                        prompt,
                        "Active Incident: {} (Severity: {}, Status: {})",
                        incident.title, incident.severity, incident.status
                    );
                    if !incident.affected_environments.is_empty() {
                        let _ = writeln!(
                            prompt,
                            "Affected environments: {}",
                            incident.affected_environments.join(", ")
                        );
                    }
                }
            }
        }

        if !self.runbooks.is_empty() {
            prompt.push_str("\n## Relevant Runbooks\n");
            for rb in &self.runbooks {
                let _ = write!(prompt, "### {}\nTrigger: {}\n{}\n\n", rb.title, rb.trigger, rb.content);
            }
        }

        prompt
    }
}

pub struct ContextBuilder<'a> {
    lookup: &'a dyn EntityLookup,
    tools: &'a ToolAccessConfig,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(lookup: &'a dyn EntityLookup, tools: &'a ToolAccessConfig) -> Self {
        Self { lookup, tools }
    }

    pub async fn build(
        &self,
        user: UserIdentity,
        context: Option<ContextRef>,
        catalog: ToolCatalog,
    ) -> Result<SessionContext> {
        let (target, runbooks) = match context {
            Some(reference) => {
                let (target, runbooks) = self.resolve(reference).await.map_err(|e| {
                    EngineError::ContextResolutionFailed(format!(
                        "{} {}: {e}",
                        reference.kind, reference.id
                    ))
                })?;
                (Some(target), runbooks)
            }
            None => (None, Vec::new()),
        };

        debug!(
            user = %user.id,
            tools = catalog.len(),
            runbooks = runbooks.len(),
            "Built session context"
        );

        Ok(SessionContext {
            user,
            target,
            runbooks,
            tools: self.tools.clone(),
            catalog,
        })
    }

    async fn resolve(&self, reference: ContextRef) -> Result<(TargetContext, Vec<Runbook>)> {
        match reference.kind {
            ContextKind::Service => {
                let service = self.lookup.get_service(reference.id).await?;
                let runbooks = self.lookup.list_runbooks(service.id).await?;
                Ok((TargetContext::Service { service }, runbooks))
            }
            ContextKind::Environment => {
                let environment = self.lookup.get_environment(reference.id).await?;
                let service = self.lookup.get_service(environment.service_id).await?;
                let runbooks = self.lookup.list_runbooks(service.id).await?;
                Ok((
                    TargetContext::Environment {
                        environment,
                        service,
                    },
                    runbooks,
                ))
            }
            ContextKind::Incident => {
                let incident = self.lookup.get_incident(reference.id).await?;
                Ok((TargetContext::Incident { incident }, Vec::new()))
            }
        }
    }
}
