//! Web Search Integration
//!
//! Abstractions and implementations for web search backends.

mod duckduckgo;

pub use duckduckgo::DuckDuckGoClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::SearchHit;

/// Search client trait (Strategy pattern)
///
/// Implement this for each backend: DuckDuckGo, Brave, SerpAPI, etc.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run a query, returning at most `limit` hits
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Backend name
    fn name(&self) -> &str;
}
