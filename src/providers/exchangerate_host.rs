use crate::core::currency::{QuoteProvider, RefreshError};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Client for the exchangerate.host `live` endpoint.
pub struct ExchangeRateHostProvider {
    api_url: String,
    access_key: String,
    client: reqwest::Client,
}

impl ExchangeRateHostProvider {
    pub fn new(
        api_url: &str,
        access_key: &str,
        timeout: Duration,
    ) -> Result<Self, RefreshError> {
        let client = reqwest::Client::builder()
            .user_agent("fxconv/1.0")
            .timeout(timeout)
            .build()?;
        Ok(ExchangeRateHostProvider {
            api_url: api_url.to_string(),
            access_key: access_key.to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LiveResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    quotes: Option<HashMap<String, f64>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Strips the base prefix from every quote key ("EURUSD" -> "USD").
///
/// Any malformed entry rejects the whole set.
pub fn parse_quotes(
    base: &str,
    quotes: HashMap<String, f64>,
) -> Result<HashMap<String, f64>, RefreshError> {
    let base = base.to_uppercase();
    quotes
        .into_iter()
        .map(|(key, rate)| {
            let upper = key.to_uppercase();
            let code = upper
                .strip_prefix(&base)
                .filter(|code| code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()));
            match code {
                Some(code) if rate.is_finite() && rate > 0.0 => Ok((code.to_string(), rate)),
                _ => Err(RefreshError::InvalidQuote { key, rate }),
            }
        })
        .collect()
}

#[async_trait]
impl QuoteProvider for ExchangeRateHostProvider {
    #[instrument(name = "ExchangeRateHostFetch", skip(self, currencies))]
    async fn fetch_rates(
        &self,
        base: &str,
        currencies: &[String],
    ) -> Result<HashMap<String, f64>, RefreshError> {
        let symbols = currencies.join(",");
        let url = Url::parse_with_params(
            &self.api_url,
            &[
                ("access_key", self.access_key.as_str()),
                ("source", base),
                ("currencies", symbols.as_str()),
            ],
        )
        .map_err(|e| RefreshError::Provider(format!("Invalid API URL {}: {e}", self.api_url)))?;

        // The URL carries the access key
        debug!(api_url = %self.api_url, %symbols, "Requesting exchange rates");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RefreshError::Status(response.status()));
        }

        let text = response.text().await?;
        let data: LiveResponse = serde_json::from_str(&text)?;

        if !data.success {
            let reason = data
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(RefreshError::Provider(reason));
        }

        let quotes = data
            .quotes
            .filter(|q| !q.is_empty())
            .ok_or(RefreshError::EmptyQuotes)?;
        debug!(count = quotes.len(), "Received quotes");

        parse_quotes(base, quotes)
    }
}
