//! Error Types

use std::time::Duration;

use thiserror::Error;

use crate::message::ToolCallRequest;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
///
/// Only registry misconfiguration and completion-service faults surface
/// through this type. Tool failures and unresolvable tool calls are folded
/// back into the conversation as tool results instead.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Two registered tools declare the same schema name
    #[error("Duplicate tool name: {0}")]
    DuplicateToolName(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments do not satisfy the tool's schema
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// LLM provider error (the completion request itself failed)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Completion request exceeded the configured deadline
    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    /// Parse error (e.g., malformed provider payload)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Whether this error means the completion service failed for the turn
    pub fn is_inference_failure(&self) -> bool {
        matches!(
            self,
            AgentError::Provider(_)
                | AgentError::ProviderUnavailable(_)
                | AgentError::Timeout(_)
                | AgentError::Parse(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            AgentError::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            AgentError::Timeout(_) => "The AI service took too long to respond.".into(),
            AgentError::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            AgentError::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            AgentError::DuplicateToolName(name) => {
                format!("The agent is misconfigured: tool '{name}' is registered twice.")
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}

/// A model-declared tool call that no resolution rule could map to a tool
#[derive(Error, Debug, Clone)]
#[error("Unresolved tool call '{}': {reason}", request.name)]
pub struct UnresolvedToolCall {
    /// The request exactly as the model produced it
    pub request: ToolCallRequest,

    /// Why every rule declined it
    pub reason: String,
}

impl UnresolvedToolCall {
    pub fn new(request: &ToolCallRequest, reason: impl Into<String>) -> Self {
        Self {
            request: request.clone(),
            reason: reason.into(),
        }
    }
}
