//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, AgentOutcome, SessionId, provider::ModelInfo};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
    pub tools: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub conversation_id: String,
    pub model: String,
    /// `answer` or `budget_exhausted`
    pub status: &'static str,
    pub turns: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn agent_error(e: &AgentError) -> ApiError {
    let status = match e {
        AgentError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        e if e.is_inference_failure() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, "AGENT_ERROR", e.user_message())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.agent.provider();
    let provider_connected = provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: provider.name().to_string(),
        provider_connected,
        tools: state
            .agent
            .tools()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// List models offered by the completion service
pub async fn list_models(
    State(state): State<AppState>,
) -> Result<Json<Vec<ModelInfo>>, ApiError> {
    state
        .agent
        .provider()
        .list_models()
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(error = %e, "Failed to list models");
            agent_error(&e)
        })
}

/// Run one user message through the agent loop.
///
/// Messages with the same `conversation_id` share a conversation; a new id
/// is issued when none is given.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "EMPTY_MESSAGE",
            "Message must not be empty",
        ));
    }

    let requested = payload.conversation_id.map(SessionId::from_string);
    let (id, session) = state
        .sessions
        .get_or_create(requested, || state.agent.new_session())
        .await;

    let mut session = session.lock().await;
    let outcome = session
        .send(&state.agent, payload.message)
        .await
        .map_err(|e| {
            tracing::error!(conversation_id = %id, error = %e, "Agent error");
            agent_error(&e)
        })?;

    let (message, status) = match &outcome {
        AgentOutcome::Answer { content, .. } => (content.clone(), "answer"),
        AgentOutcome::BudgetExhausted { last_content, .. } => (
            last_content.clone().unwrap_or_default(),
            "budget_exhausted",
        ),
    };

    Ok(Json(ChatResponse {
        message,
        conversation_id: id.to_string(),
        model: session.metadata.model.clone(),
        status,
        turns: outcome.turns(),
    }))
}

/// Drop a conversation and its history
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.sessions.remove(&SessionId::from_string(id)).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
