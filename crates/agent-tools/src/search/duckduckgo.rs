//! DuckDuckGo Instant Answer client
//!
//! Queries `?q=<query>&format=json&no_html=1` and flattens the abstract,
//! direct results and related topics into [`SearchHit`]s.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::SearchClient;
use crate::error::{Result, ToolsError};
use crate::model::SearchHit;

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com";

pub struct DuckDuckGoClient {
    client: reqwest::Client,
    endpoint: String,
}

impl Default for DuckDuckGoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoClient {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Use a different API endpoint (self-hosted proxy, test server)
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    results: Vec<Topic>,
    #[serde(default)]
    related_topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Topic {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "FirstURL")]
    first_url: String,
    /// Present on category groups instead of `text`
    #[serde(default)]
    topics: Vec<Topic>,
}

impl Topic {
    fn collect_hits(self, hits: &mut Vec<SearchHit>) {
        if !self.text.is_empty() && !self.first_url.is_empty() {
            let title = self
                .text
                .split(" - ")
                .next()
                .unwrap_or(&self.text)
                .to_string();
            hits.push(SearchHit {
                title,
                url: self.first_url,
                snippet: self.text,
            });
        }
        for topic in self.topics {
            topic.collect_hits(hits);
        }
    }
}

impl InstantAnswer {
    fn into_hits(self, limit: usize) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        if !self.abstract_text.is_empty() {
            hits.push(SearchHit {
                title: self.heading,
                url: self.abstract_url,
                snippet: self.abstract_text,
            });
        }
        for topic in self.results.into_iter().chain(self.related_topics) {
            topic.collect_hits(&mut hits);
        }
        hits.truncate(limit);
        hits
    }
}

#[async_trait]
impl SearchClient for DuckDuckGoClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        debug!(query, limit, "DuckDuckGo search");

        let resp = self
            .client
            .get(format!("{}/", self.endpoint))
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ToolsError::Search(format!(
                "search API returned {}",
                resp.status()
            )));
        }

        let answer: InstantAnswer = serde_json::from_slice(&resp.bytes().await?)?;
        Ok(answer.into_hits(limit))
    }

    fn name(&self) -> &str {
        "DuckDuckGo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flattens_nested_topics() {
        let answer: InstantAnswer = serde_json::from_value(json!({
            "Heading": "Rust",
            "AbstractText": "Rust is a systems programming language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
            "Results": [],
            "RelatedTopics": [
                {"Text": "Cargo - Rust package manager", "FirstURL": "https://duckduckgo.com/Cargo"},
                {"Name": "Tools", "Topics": [
                    {"Text": "Clippy - Rust linter", "FirstURL": "https://duckduckgo.com/Clippy"}
                ]}
            ]
        }))
        .unwrap();

        let hits = answer.into_hits(10);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Rust");
        assert_eq!(hits[1].title, "Cargo");
        assert_eq!(hits[2].url, "https://duckduckgo.com/Clippy");
    }

    #[test]
    fn test_respects_limit() {
        let answer: InstantAnswer = serde_json::from_value(json!({
            "RelatedTopics": [
                {"Text": "a", "FirstURL": "https://a"},
                {"Text": "b", "FirstURL": "https://b"},
                {"Text": "c", "FirstURL": "https://c"}
            ]
        }))
        .unwrap();

        assert_eq!(answer.into_hits(2).len(), 2);
    }
}
