//! A model that plays back a fixed script, for tests and demos.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use solomon_common::{EngineError, Message, Result};

use super::{ChunkSink, ModelClient, ModelReply};
use crate::catalog::Tool;

enum Step {
    Reply { reply: ModelReply, chunks: Vec<String> },
    Fail(String),
}

/// Answers each call with the next scripted step. Once the script runs out
/// every call gets an empty reply.
#[derive(Default)]
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Vec<Message>>>,
    latency: Duration,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn then_reply(self, reply: ModelReply) -> Self {
        self.push(Step::Reply {
            reply,
            chunks: Vec::new(),
        })
    }

    /// Stream `chunks` through the callback, then reply with their concatenation.
    pub fn then_stream(self, chunks: &[&str]) -> Self {
        let chunks: Vec<String> = chunks.iter().map(|c| c.to_string()).collect();
        let reply = ModelReply::text(chunks.concat());
        self.push(Step::Reply { reply, chunks })
    }

    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Step::Fail(message.into()))
    }

    /// Message logs the model was called with, in call order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn push(self, step: Step) -> Self {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push_back(step);
        }
        self
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn converse(
        &self,
        messages: &[Message],
        _tools: &[Tool],
        on_chunk: ChunkSink,
    ) -> Result<ModelReply> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        let step = self.steps.lock().ok().and_then(|mut s| s.pop_front());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match step {
            Some(Step::Reply { reply, chunks }) => {
                for chunk in chunks {
                    on_chunk(chunk);
                }
                Ok(reply)
            }
            Some(Step::Fail(message)) => Err(EngineError::ModelInvocationFailed(message)),
            None => Ok(ModelReply::default()),
        }
    }
}
