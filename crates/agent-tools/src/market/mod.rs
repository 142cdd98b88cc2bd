//! Market Data Integration
//!
//! Abstractions and implementations for quote sources.

mod mock;

pub use mock::StaticMarketData;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Quote;

/// Market data client trait (Strategy pattern)
///
/// Implement this for each venue or data vendor.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Get the current quote for a ticker
    async fn quote(&self, ticker: &str) -> Result<Quote>;

    /// Check if the source is available
    async fn health_check(&self) -> bool;

    /// Source name
    fn name(&self) -> &str;
}
