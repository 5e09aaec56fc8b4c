//! A stand-in model for driving the console by hand.
//!
//! A user message of the form `!<tool> <json>` becomes a tool call; any
//! other message is acknowledged. Tool results are acknowledged without
//! further calls, which ends the turn.

use async_trait::async_trait;
use solomon_common::{Message, MessageRole, Result};

use super::{ChunkSink, ModelClient, ModelReply};
use crate::catalog::Tool;

#[derive(Debug, Default)]
pub struct DirectiveModel;

impl DirectiveModel {
    pub fn new() -> Self {
        Self
    }

    fn parse_directive(text: &str, tools: &[Tool]) -> ModelReply {
        let body = text.trim_start_matches('!').trim();
        let (name, raw_input) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };

        if !tools.iter().any(|t| t.name == name) {
            return ModelReply::text(format!("No tool named '{name}' is available here."));
        }

        let input = if raw_input.is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(raw_input) {
                Ok(value) => value,
                Err(e) => return ModelReply::text(format!("Could not read tool input: {e}")),
            }
        };

        ModelReply::text(format!("Requesting {name}.")).with_tool_call(name, input)
    }
}

#[async_trait]
impl ModelClient for DirectiveModel {
    async fn converse(
        &self,
        messages: &[Message],
        tools: &[Tool],
        on_chunk: ChunkSink,
    ) -> Result<ModelReply> {
        let Some(last) = messages.last() else {
            return Ok(ModelReply::default());
        };

        let reply = match last.role {
            MessageRole::User if last.content.trim_start().starts_with('!') => {
                Self::parse_directive(last.content.trim_start(), tools)
            }
            MessageRole::User => ModelReply::text(format!("Acknowledged: {}", last.content)),
            MessageRole::Tool => ModelReply::text("Tool result received."),
            MessageRole::System | MessageRole::Assistant => ModelReply::default(),
        };

        for word in reply.content.split_inclusive(' ') {
            on_chunk(word.to_string());
        }
        Ok(reply)
    }
}
