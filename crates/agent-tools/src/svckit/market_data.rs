//! Market Data Tool
//!
//! Current price and daily change for a list of tickers.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

use agent_core::{Arguments, ParameterSchema, Tool, ToolResult, ToolSchema};

use crate::market::MarketDataClient;

const NO_PRICE: &str = "Price data not available.";
const LOOKUP_FAILED: &str = "Invalid Ticker or Data Error";

/// Tool for looking up stock and crypto quotes
pub struct MarketDataTool {
    client: Arc<dyn MarketDataClient>,
}

impl MarketDataTool {
    pub fn new(client: Arc<dyn MarketDataClient>) -> Self {
        Self { client }
    }
}

fn split_tickers(raw: &str) -> Vec<Value> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| json!(s))
        .collect()
}

#[async_trait]
impl Tool for MarketDataTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "market_data",
            "Get the current price and daily change for a list of stock tickers (e.g., [\"GOOG\", \"NVDA\"]).",
        )
        .param(
            ParameterSchema::required("tickers", "array", "Ticker symbols to look up")
                .with_items("string"),
        )
    }

    /// One entry per ticker; a bad ticker never fails the whole call
    async fn execute(&self, arguments: &Arguments) -> ToolResult {
        let tickers: Option<Vec<&str>> = arguments
            .get("tickers")
            .and_then(Value::as_array)
            .and_then(|items| items.iter().map(Value::as_str).collect());
        let tickers = match tickers {
            Some(tickers) if !tickers.is_empty() => tickers,
            Some(_) => return ToolResult::error("tickers must not be empty"),
            None => return ToolResult::error("tickers must be a list of symbols"),
        };

        let mut report = Map::new();
        for ticker in tickers {
            let line = match self.client.quote(ticker).await {
                Ok(quote) => quote.summary().unwrap_or_else(|| NO_PRICE.to_string()),
                Err(e) => {
                    debug!(ticker, error = %e, "Quote lookup failed");
                    LOOKUP_FAILED.to_string()
                }
            };
            report.insert(ticker.to_string(), json!(line));
        }

        ToolResult::ok(Value::Object(report))
    }

    /// Accepts `"GOOG, NVDA"` in place of a list, and the usual synonyms
    /// for the parameter name
    fn adapt_arguments(&self, arguments: &Arguments) -> Option<Arguments> {
        let value = ["tickers", "symbols", "ticker", "symbol"]
            .iter()
            .find_map(|key| arguments.get(*key))?;

        let tickers = match value {
            Value::String(s) => split_tickers(s),
            Value::Array(items) if items.iter().all(Value::is_string) => items.clone(),
            _ => return None,
        };
        if tickers.is_empty() {
            return None;
        }

        let mut adapted = Arguments::new();
        adapted.insert("tickers".into(), Value::Array(tickers));
        Some(adapted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::StaticMarketData;
    use agent_core::{ToolCallRequest, ToolRegistry};

    fn tool() -> MarketDataTool {
        MarketDataTool::new(Arc::new(StaticMarketData::new()))
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_report_per_ticker() {
        let result = tool()
            .execute(&args(json!({"tickers": ["NVDA", "ARM", "NOTREAL"]})))
            .await;

        let ToolResult::Ok(report) = result else {
            panic!("expected a report");
        };
        assert_eq!(report["NVDA"], "$181.50 (+2.31%)");
        assert_eq!(report["ARM"], NO_PRICE);
        assert_eq!(report["NOTREAL"], LOOKUP_FAILED);
    }

    #[tokio::test]
    async fn test_empty_or_non_string_tickers_are_errors() {
        let empty = tool().execute(&args(json!({"tickers": []}))).await;
        assert_eq!(empty, ToolResult::error("tickers must not be empty"));

        let numbers = tool().execute(&args(json!({"tickers": [1, 2]}))).await;
        assert!(!numbers.is_ok());
    }

    #[test]
    fn test_non_string_tickers_fail_resolution() {
        let mut registry = ToolRegistry::new();
        registry.register(tool()).unwrap();

        let call = ToolCallRequest::new("market_data", args(json!({"tickers": [1, 2]})));
        let err = registry.resolve(&call).unwrap_err();
        assert!(err.reason.contains("market_data"));
    }

    #[test]
    fn test_adapt_comma_separated() {
        let adapted = tool()
            .adapt_arguments(&args(json!({"tickers": "GOOG, NVDA"})))
            .unwrap();
        assert_eq!(adapted, args(json!({"tickers": ["GOOG", "NVDA"]})));
    }

    #[test]
    fn test_adapt_synonyms() {
        let adapted = tool()
            .adapt_arguments(&args(json!({"symbol": "MSFT"})))
            .unwrap();
        assert_eq!(adapted, args(json!({"tickers": ["MSFT"]})));

        assert!(tool().adapt_arguments(&args(json!({"query": "MSFT"}))).is_none());
    }
}
