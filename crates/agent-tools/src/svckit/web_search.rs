//! Web Search Tool
//!
//! Looks things up on the web through a pluggable [`SearchClient`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use agent_core::{Arguments, ParameterSchema, Tool, ToolResult, ToolSchema};

use crate::search::SearchClient;

const DEFAULT_MAX_RESULTS: u64 = 5;
const MAX_RESULTS_CAP: u64 = 20;

/// Tool for searching the web
pub struct WebSearchTool {
    client: Arc<dyn SearchClient>,
}

impl WebSearchTool {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "web_search",
            "Search the web for recent information. Returns titles, URLs and snippets.",
        )
        .param(ParameterSchema::required(
            "query",
            "string",
            "What to search for",
        ))
        .param(
            ParameterSchema::new(
                "max_results",
                "integer",
                "Maximum number of results to return",
            )
            .with_default(json!(DEFAULT_MAX_RESULTS)),
        )
    }

    async fn execute(&self, arguments: &Arguments) -> ToolResult {
        let query = match arguments.get("query").and_then(Value::as_str) {
            Some(q) if !q.trim().is_empty() => q.trim(),
            _ => return ToolResult::error("Query must not be empty"),
        };

        let limit = arguments
            .get("max_results")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .clamp(1, MAX_RESULTS_CAP);

        debug!(query, limit, backend = self.client.name(), "Web search");

        match self
            .client
            .search(query, usize::try_from(limit).unwrap_or(1))
            .await
        {
            Ok(hits) => ToolResult::ok(json!(hits)),
            Err(e) => {
                warn!(error = %e, query, "Web search failed");
                ToolResult::error(e.to_string())
            }
        }
    }

    /// A lone string argument under any name is taken as the query
    fn adapt_arguments(&self, arguments: &Arguments) -> Option<Arguments> {
        let mut values = arguments.values();
        let only = values.next()?.as_str()?;
        if values.next().is_some() {
            return None;
        }

        let mut adapted = Arguments::new();
        adapted.insert("query".into(), json!(only));
        Some(adapted)
    }
}
