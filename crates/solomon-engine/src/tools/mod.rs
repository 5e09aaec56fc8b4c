//! Tool execution: one handler per tool name.
//!
//! The engine never talks to clusters or cloud APIs itself; it hands an
//! approved action's input to whichever handler is registered for the tool.

mod dry_run;

pub use dry_run::DryRunHandler;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use solomon_common::{EngineError, Result};
use tracing::debug;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool. Errors are plain messages; they end up on the action.
    async fn run(&self, input: &serde_json::Value) -> std::result::Result<serde_json::Value, String>;
}

/// Adapts a synchronous closure into a [`ToolHandler`].
pub struct FnHandler<F>(F);

impl<F> FnHandler<F>
where
    F: Fn(&serde_json::Value) -> std::result::Result<serde_json::Value, String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ToolHandler for FnHandler<F>
where
    F: Fn(&serde_json::Value) -> std::result::Result<serde_json::Value, String> + Send + Sync,
{
    async fn run(&self, input: &serde_json::Value) -> std::result::Result<serde_json::Value, String> {
        (self.0)(input)
    }
}

/// Dispatches tool runs to handlers by name.
#[derive(Default, Clone)]
pub struct ToolRunner {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    fallback: Option<Arc<dyn ToolHandler>>,
}

impl ToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(mut self, name: impl Into<String>, handler: impl ToolHandler + 'static) -> Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    /// Handler used for tools without a dedicated one.
    pub fn with_fallback(mut self, handler: impl ToolHandler + 'static) -> Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name) || self.fallback.is_some()
    }

    pub async fn run(
        &self,
        name: &str,
        input: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let handler = self
            .handlers
            .get(name)
            .or(self.fallback.as_ref())
            .ok_or_else(|| {
                EngineError::ToolExecutionFailed(format!("no handler registered for tool '{name}'"))
            })?;
        debug!(tool = %name, "Running tool handler");
        handler
            .run(input)
            .await
            .map_err(EngineError::ToolExecutionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn dispatches_by_name() {
        let runner = ToolRunner::new()
            .with_handler("get_health", FnHandler::new(|_| Ok(json!({"status": "healthy"}))))
            .with_handler("query_logs", FnHandler::new(|_| Ok(json!({"lines": 0}))));

        let out = runner.run("get_health", &json!({})).await.unwrap();
        assert_eq!(out["status"], "healthy");
    }

    #[tokio::test]
    async fn unknown_tool_without_fallback_fails() {
        let runner = ToolRunner::new();
        let err = runner.run("deploy", &json!({})).await.unwrap_err();
        assert!(matches!(err, EngineError::ToolExecutionFailed(_)));
        assert!(err.to_string().contains("deploy"));
        assert!(!runner.has_handler("deploy"));
    }

    #[tokio::test]
    async fn fallback_serves_unregistered_tools() {
        let runner = ToolRunner::new().with_fallback(DryRunHandler::new("dry"));
        assert!(runner.has_handler("rollback"));
        let out = runner.run("rollback", &json!({"service": "api"})).await.unwrap();
        assert_eq!(out["dry_run"], true);
    }

    #[tokio::test]
    async fn handler_errors_pass_through() {
        let runner = ToolRunner::new().with_handler(
            "restart_service",
            FnHandler::new(|_| Err("deployment not found".to_string())),
        );
        let err = runner.run("restart_service", &json!({})).await.unwrap_err();
        assert!(
            matches!(err, EngineError::ToolExecutionFailed(ref msg) if msg == "deployment not found")
        );
    }
}
