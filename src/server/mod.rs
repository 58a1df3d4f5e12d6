//! HTTP surface of the converter.

pub mod error;
pub mod handlers;

use crate::core::config::AppConfig;
use crate::core::converter::Converter;
use crate::core::currency::QuoteProvider;
use crate::core::rates::RateStore;
use crate::core::refresh::RateRefresher;
use crate::core::scheduler::RefreshScheduler;
use crate::providers::ExchangeRateHostProvider;
use anyhow::{Context, Result};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub struct AppState {
    pub store: Arc<RateStore>,
    pub converter: Converter,
}

impl AppState {
    pub fn new(store: Arc<RateStore>) -> Self {
        let converter = Converter::new(Arc::clone(&store));
        AppState { store, converter }
    }
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/currencies/convert", get(handlers::convert))
        .route("/currencies/rates", get(handlers::rates))
        .route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builds the provider configured in `config`.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn QuoteProvider>> {
    let provider = ExchangeRateHostProvider::new(
        &config.exchange.api_url,
        &config.exchange.api_key,
        config.exchange.request_timeout(),
    )
    .context("Failed to create HTTP client")?;
    Ok(Arc::new(provider))
}

/// Creates the rate store and runs the initial refresh.
///
/// A failed initial refresh is fatal when `require_initial_rates` is set,
/// otherwise the service starts with an empty table.
pub async fn build_state(
    config: &AppConfig,
    provider: Arc<dyn QuoteProvider>,
) -> Result<(Arc<AppState>, RateRefresher)> {
    let store = Arc::new(RateStore::new());
    let refresher = RateRefresher::new(
        Arc::clone(&store),
        provider,
        config.exchange.currency_list(),
    );

    if let Err(e) = refresher.refresh().await {
        if config.require_initial_rates {
            return Err(e).context("Failed to fetch initial exchange rates");
        }
        warn!(error = %e, "Initial rate fetch failed, starting with an empty table");
    }

    Ok((Arc::new(AppState::new(store)), refresher))
}

pub async fn serve(config: &AppConfig) -> Result<()> {
    let provider = build_provider(config)?;
    let (state, refresher) = build_state(config, provider).await?;
    let scheduler = RefreshScheduler::start_interval(refresher, config.refresh_interval());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);

    let result = axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    scheduler.stop().await;
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
