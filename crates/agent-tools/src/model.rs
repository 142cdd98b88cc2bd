//! Domain Models
//!
//! Data returned by the search and market-data backends.
//! Uses `rust_decimal` for prices - never use f64 for money!

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price quote for a listed instrument
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker symbol (e.g., "NVDA", "BTC")
    pub symbol: String,

    /// Full name (e.g., "NVIDIA Corporation")
    pub name: String,

    /// Current price in USD, if the venue reported one
    pub price_usd: Option<Decimal>,

    /// Daily change in percent, if known
    pub change_percent: Option<Decimal>,

    /// Last price update
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, price_usd: Decimal) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
            price_usd: Some(price_usd),
            change_percent: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_change(mut self, change_percent: Decimal) -> Self {
        self.change_percent = Some(change_percent);
        self
    }

    /// `"$price (+x.xx%)"`, or `None` when price or change is missing
    pub fn summary(&self) -> Option<String> {
        let price = two_places(self.price_usd?);
        let change = two_places(self.change_percent?);
        let sign = if change < Decimal::ZERO { '-' } else { '+' };
        Some(format!("${price} ({sign}{}%)", change.abs()))
    }
}

fn two_places(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded
}

/// A single web search result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_summary() {
        let quote = Quote::new("nvda", "NVIDIA", dec!(181.5)).with_change(dec!(2.346));
        assert_eq!(quote.symbol, "NVDA");
        assert_eq!(quote.summary().as_deref(), Some("$181.50 (+2.35%)"));

        let falling = Quote::new("GOOG", "Alphabet", dec!(170)).with_change(dec!(-0.5));
        assert_eq!(falling.summary().as_deref(), Some("$170.00 (-0.50%)"));
    }

    #[test]
    fn test_quote_summary_requires_change() {
        let quote = Quote::new("BTC", "Bitcoin", dec!(97500));
        assert!(quote.summary().is_none());
    }
}
