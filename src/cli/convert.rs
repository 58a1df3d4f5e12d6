use crate::core::config::AppConfig;
use crate::core::converter::{ConversionRequest, Converter};
use crate::core::currency::QuoteProvider;
use crate::core::rates::RateStore;
use crate::core::refresh::RateRefresher;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Fetches rates once and converts `amount` from `source` to `target`.
pub async fn convert_once(
    config: &AppConfig,
    provider: Arc<dyn QuoteProvider>,
    source: &str,
    target: &str,
    amount: f64,
) -> Result<f64> {
    let request = ConversionRequest {
        source: Some(source.to_string()),
        target: Some(target.to_string()),
        amount: Some(amount),
    }
    .validate()?;

    let store = Arc::new(RateStore::new());
    let refresher = RateRefresher::new(
        Arc::clone(&store),
        provider,
        config.exchange.currency_list(),
    );
    refresher
        .refresh()
        .await
        .context("Failed to fetch exchange rates")?;

    Ok(Converter::new(store).convert_request(&request)?)
}
