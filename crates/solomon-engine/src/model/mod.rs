//! The language-model seam.
//!
//! The engine only needs one operation from a model: given the message log
//! and the session's tools, produce assistant text and any tool calls.
//! Text may be streamed through the chunk callback while the call runs.

mod directive;
mod scripted;

pub use directive::DirectiveModel;
pub use scripted::ScriptedModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solomon_common::{Message, Result};

use crate::catalog::Tool;

/// Receives streamed text chunks while a model call is in flight.
pub type ChunkSink = Box<dyn Fn(String) + Send + Sync>;

#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn converse(
        &self,
        messages: &[Message],
        tools: &[Tool],
        on_chunk: ChunkSink,
    ) -> Result<ModelReply>;
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub input: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_call(mut self, name: impl Into<String>, input: serde_json::Value) -> Self {
        self.tool_calls.push(ToolCall::new(name, input));
        self
    }
}
