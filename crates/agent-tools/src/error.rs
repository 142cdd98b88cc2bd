//! Error Types for Built-in Tools
//!
//! These never cross `Tool::execute`; each tool turns them into an error result.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolsError>;

#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("Invalid expression: {0}")]
    Expression(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Search error: {0}")]
    Search(String),

    #[error("Ticker not supported: {0}")]
    UnsupportedTicker(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
