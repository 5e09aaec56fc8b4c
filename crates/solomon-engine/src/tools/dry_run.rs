use async_trait::async_trait;
use serde_json::json;

use super::ToolHandler;

/// Echoes the input back without touching any infrastructure.
#[derive(Debug, Clone)]
pub struct DryRunHandler {
    label: String,
}

impl DryRunHandler {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

#[async_trait]
impl ToolHandler for DryRunHandler {
    async fn run(&self, input: &serde_json::Value) -> Result<serde_json::Value, String> {
        Ok(json!({
            "dry_run": true,
            "handler": self.label,
            "input": input,
        }))
    }
}
