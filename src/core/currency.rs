//! Exchange rate source abstractions

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),
    #[error("Failed to parse rate response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Rate provider returned an error: {0}")]
    Provider(String),
    #[error("No exchange rates found in response")]
    EmptyQuotes,
    #[error("Invalid quote {key}: {rate}")]
    InvalidQuote { key: String, rate: f64 },
}

/// A source of exchange rates relative to a base currency.
///
/// Implementations return the complete set of rates for one fetch, keyed by
/// upper-case currency code with the base prefix already stripped, or an
/// error. A partial result is never returned.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_rates(
        &self,
        base: &str,
        currencies: &[String],
    ) -> Result<HashMap<String, f64>, RefreshError>;
}
