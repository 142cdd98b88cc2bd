//! Scripted provider for tests
//!
//! Replays a queue of assistant messages and records every request it
//! receives, so tests can assert on what the loop sent each turn.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::message::{Message, ToolCallRequest};
use crate::provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo};
use crate::tool::ToolSchema;

/// One recorded `complete` call
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
    pub model: String,
}

enum Step {
    Reply(Message),
    Fail(String),
}

/// Provider that returns pre-scripted responses in order
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Step>>,
    /// Returned once the script runs out
    fallback: Option<Message>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a plain-text assistant reply
    pub fn reply(self, content: &str) -> Self {
        self.push(Step::Reply(Message::assistant(content)))
    }

    /// Queue an assistant reply declaring tool calls
    pub fn tool_calls(self, content: &str, calls: Vec<ToolCallRequest>) -> Self {
        self.push(Step::Reply(Message::assistant_with_tool_calls(content, calls)))
    }

    /// Queue a provider failure
    pub fn fail(self, message: &str) -> Self {
        self.push(Step::Fail(message.to_string()))
    }

    /// Answer every request past the script with the same message
    pub fn repeat(mut self, message: Message) -> Self {
        self.fallback = Some(message);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn push(self, step: Step) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(step);
        }
        self
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                messages: messages.to_vec(),
                tools: tools.iter().map(|t| t.name.clone()).collect(),
                model: options.model.clone(),
            });
        }

        let step = self
            .script
            .lock()
            .map_err(|e| AgentError::Other(e.to_string()))?
            .pop_front();

        let message = match step {
            Some(Step::Reply(message)) => message,
            Some(Step::Fail(message)) => return Err(AgentError::Provider(message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| AgentError::Provider("script exhausted".into()))?,
        };

        let finish_reason = if message.has_tool_calls() {
            FinishReason::ToolUse
        } else {
            FinishReason::Stop
        };

        Ok(Completion {
            message,
            model: options.model.clone(),
            usage: None,
            finish_reason: Some(finish_reason),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: "scripted".into(),
            name: "scripted".into(),
            size_bytes: None,
        }])
    }
}
