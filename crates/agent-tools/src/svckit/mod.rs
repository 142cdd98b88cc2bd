//! Service Kit - Agent Tools
//!
//! Built-in tools that implement `agent_core::Tool`.

mod calculator;
mod market_data;
mod web_search;

pub use calculator::CalculatorTool;
pub use market_data::MarketDataTool;
pub use web_search::WebSearchTool;
