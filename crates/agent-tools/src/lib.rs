//! # agent-tools
//!
//! Built-in tools for the tool-use agent.
//!
//! ```text
//! ┌──────────────┬──────────────────────┬─────────────────────────────┐
//! │ Tool         │ Parameters           │ Backend                     │
//! ├──────────────┼──────────────────────┼─────────────────────────────┤
//! │ calculator   │ expression           │ built-in expression parser  │
//! │ web_search   │ query, max_results?  │ SearchClient (DuckDuckGo)   │
//! │ market_data  │ tickers[]            │ MarketDataClient            │
//! └──────────────┴──────────────────────┴─────────────────────────────┘
//! ```
//!
//! Every tool reports failures as an error result rather than an `Err`, and
//! each one knows how to repair the argument shapes models commonly get
//! wrong (see `Tool::adapt_arguments`).

pub mod error;
pub mod expression;
pub mod market;
pub mod model;
pub mod search;
pub mod svckit;

pub use error::{Result, ToolsError};
pub use model::{Quote, SearchHit};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{CalculatorTool, MarketDataTool, WebSearchTool};
}

/// System prompt for an agent equipped with these tools
pub const ASSISTANT_PROMPT: &str = r"You are a helpful assistant with access to tools.

## Tools Available

- `calculator` - Evaluate arithmetic expressions
- `web_search` - Search the web for recent information
- `market_data` - Get current stock prices and daily change

## Rules

1. You MUST use the `calculator` tool for any mathematical calculation to ensure accuracy.
2. Use `web_search` for anything that may have changed recently.
3. Use `market_data` whenever you mention a company's stock price.
4. For all other questions, answer directly.";
