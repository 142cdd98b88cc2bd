//! tool-agent HTTP Server
//!
//! Axum-based server exposing the tool-use agent over a small REST API.
//! Each request runs the full orchestration loop, tools included.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, LlmProvider};
use agent_runtime::OllamaProvider;
use agent_tools::{
    ASSISTANT_PROMPT,
    market::StaticMarketData,
    search::DuckDuckGoClient,
    tools::{CalculatorTool, MarketDataTool, WebSearchTool},
};

use crate::config::ServerConfig;
use crate::handlers::{chat_handler, delete_session, health_check, list_models};
use crate::state::AppState;

pub(crate) fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        // Agent API
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/{id}", delete(delete_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let provider = Arc::new(OllamaProvider::from_config(config.ollama.clone()));

    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to Ollama at {}", config.ollama.base_url());
            if let Ok(models) = provider.list_models().await {
                for model in models {
                    tracing::info!("  Model: {}", model.id);
                }
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Ollama not available - chat requests will fail");
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    let search = match &config.search_api_url {
        Some(url) => DuckDuckGoClient::with_endpoint(url.clone()),
        None => DuckDuckGoClient::new(),
    };

    let agent = AgentBuilder::new()
        .provider(provider)
        .system_prompt(
            config
                .system_prompt
                .clone()
                .unwrap_or_else(|| ASSISTANT_PROMPT.to_string()),
        )
        .model(config.model.clone())
        .max_turns(config.max_turns)
        .tool(CalculatorTool::new())
        .tool(WebSearchTool::new(Arc::new(search)))
        .tool(MarketDataTool::new(Arc::new(StaticMarketData::new())));
    let agent = match config.call_timeout {
        Some(limit) => agent.call_timeout(limit),
        None => agent,
    }
    .build()?;

    tracing::info!("Registered {} tools:", agent.tools().len());
    for name in agent.tools().names() {
        tracing::info!("  • {}", name);
    }

    let app = build_router(AppState::new(agent, config.sessions));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 tool-agent server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Model: {} (max {} turns)", config.model, config.max_turns);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health     - Health check");
    tracing::info!("  GET  /api/models - List available models");
    tracing::info!("  POST /api/chat   - Send message");
    tracing::info!("  DELETE /api/chat/{{id}} - End a conversation");

    axum::serve(listener, app).await?;

    Ok(())
}
