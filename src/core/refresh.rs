use crate::core::currency::{QuoteProvider, RefreshError};
use crate::core::rates::RateStore;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Pulls rates from a [`QuoteProvider`] into a [`RateStore`].
#[derive(Clone)]
pub struct RateRefresher {
    store: Arc<RateStore>,
    provider: Arc<dyn QuoteProvider>,
    currencies: Vec<String>,
}

impl RateRefresher {
    pub fn new(
        store: Arc<RateStore>,
        provider: Arc<dyn QuoteProvider>,
        currencies: Vec<String>,
    ) -> Self {
        Self {
            store,
            provider,
            currencies,
        }
    }

    pub fn store(&self) -> &Arc<RateStore> {
        &self.store
    }

    /// Fetches a fresh set of rates and swaps it in.
    ///
    /// Returns the number of rates now held. On error the store keeps its
    /// previous snapshot.
    #[instrument(name = "RateRefresh", skip(self), fields(base = %self.store.base()))]
    pub async fn refresh(&self) -> Result<usize, RefreshError> {
        info!("Fetching exchange rates");

        let rates = self
            .provider
            .fetch_rates(self.store.base(), &self.currencies)
            .await?;
        if rates.is_empty() {
            return Err(RefreshError::EmptyQuotes);
        }

        let count = rates.len();
        self.store.replace(rates);
        info!(count, "Exchange rates updated successfully");
        Ok(count)
    }

    /// Like [`refresh`](Self::refresh) but only logs a failure.
    pub async fn refresh_logged(&self) -> bool {
        match self.refresh().await {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "Error fetching exchange rates");
                false
            }
        }
    }
}
