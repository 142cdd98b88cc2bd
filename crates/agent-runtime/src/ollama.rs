//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference, using the
//! native `/api/chat` endpoint with tool calling.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Arguments, Message, Role, ToolCallRequest},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, TokenUsage},
    tool::ToolSchema,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            timeout_secs: 120,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read `OLLAMA_HOST`, `OLLAMA_PORT` and `OLLAMA_TIMEOUT_SECS` through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("OLLAMA_HOST").unwrap_or(defaults.host),
            port: lookup("OLLAMA_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            timeout_secs: lookup("OLLAMA_TIMEOUT_SECS")
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider with custom host/port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::from_config(OllamaConfig {
            host: host.into(),
            port,
            ..Default::default()
        })
    }

    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, timeout_secs = config.timeout_secs, "HTTP client build failed; requests will have no timeout");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: config.base_url(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Create with default localhost settings
    pub fn localhost() -> Self {
        Self::from_config(OllamaConfig::default())
    }

    /// Point at an explicit base URL (e.g. `http://127.0.0.1:11434`)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Convert agent messages to Ollama format
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
                tool_calls: m
                    .tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id.clone(),
                        function: WireFunction {
                            name: call.name.clone(),
                            arguments: Value::Object(call.arguments.clone()),
                        },
                    })
                    .collect(),
                tool_name: (m.role == Role::Tool).then(|| m.name.clone()).flatten(),
            })
            .collect()
    }

    /// Tool schemas in Ollama's function-calling shape
    fn convert_tools(tools: &[ToolSchema]) -> Vec<Value> {
        tools
            .iter()
            .map(|schema| {
                json!({
                    "type": "function",
                    "function": {
                        "name": schema.name,
                        "description": schema.description,
                        "parameters": schema.input_schema(),
                    }
                })
            })
            .collect()
    }

    fn build_request_body(
        messages: &[Message],
        tools: &[ToolSchema],
        opts: &GenerationOptions,
    ) -> Value {
        let mut options = json!({
            "temperature": opts.temperature,
            "top_p": opts.top_p,
            "num_predict": opts.max_tokens,
        });
        if !opts.stop_sequences.is_empty() {
            options["stop"] = json!(opts.stop_sequences);
        }

        let mut body = json!({
            "model": opts.model,
            "messages": Self::convert_messages(messages),
            "stream": false,
            "options": options,
        });
        if !tools.is_empty() {
            body["tools"] = json!(Self::convert_tools(tools));
        }
        body
    }

    /// Convert Ollama response to agent completion
    fn convert_completion(response: ChatResponse, model: &str) -> Completion {
        let tool_calls: Vec<ToolCallRequest> = response
            .message
            .tool_calls
            .into_iter()
            .map(|call| {
                let arguments = parse_arguments(call.function.arguments).unwrap_or_else(|raw| {
                    warn!(tool = %call.function.name, raw = %raw, "Undecodable tool call arguments");
                    Arguments::new()
                });
                ToolCallRequest {
                    id: Some(call.id.unwrap_or_else(|| {
                        format!("call_{}", uuid::Uuid::new_v4().simple())
                    })),
                    name: call.function.name,
                    arguments,
                }
            })
            .collect();

        let finish_reason = match response.done_reason.as_deref() {
            _ if !tool_calls.is_empty() => FinishReason::ToolUse,
            Some("length") => FinishReason::Length,
            _ => FinishReason::Stop,
        };

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (prompt, eval) => {
                let prompt_tokens = prompt.unwrap_or(0);
                let completion_tokens = eval.unwrap_or(0);
                Some(TokenUsage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: prompt_tokens.saturating_add(completion_tokens),
                })
            }
        };

        Completion {
            message: Message::assistant_with_tool_calls(response.message.content, tool_calls),
            model: if response.model.is_empty() {
                model.to_string()
            } else {
                response.model
            },
            usage,
            finish_reason: Some(finish_reason),
        }
    }
}

/// Arguments arrive as an object, or as a JSON-encoded string from some models.
///
/// Anything that doesn't decode to an object is returned as its raw text.
fn parse_arguments(raw: Value) -> std::result::Result<Arguments, String> {
    match raw {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Arguments::new()),
        Value::String(text) => match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(text),
        },
        other => Err(other.to_string()),
    }
}

fn request_error(err: &reqwest::Error) -> AgentError {
    if err.is_connect() || err.is_timeout() {
        AgentError::ProviderUnavailable(err.to_string())
    } else {
        AgentError::Provider(err.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    message: WireMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
    #[serde(default)]
    size: Option<u64>,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.get(format!("{}/api/tags", self.base_url)).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let body = Self::build_request_body(messages, tools, options);
        debug!(
            model = %options.model,
            messages = messages.len(),
            tools = tools.len(),
            "Sending Ollama chat request"
        );

        let resp = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(&e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!("Ollama returned {status}: {text}")));
        }

        let response: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("Invalid Ollama response: {e}")))?;

        Ok(Self::convert_completion(response, &options.model))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AgentError::Provider(format!(
                "Ollama returned {} listing models",
                resp.status()
            )));
        }

        let tags: TagsResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
                size_bytes: m.size,
            })
            .collect())
    }
}
