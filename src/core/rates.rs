//! In-memory exchange rate table relative to a single base currency

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

/// Reference currency every stored rate is expressed against.
pub const BASE_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("Invalid currency: {0}")]
    UnknownCurrency(String),
}

/// An immutable, complete set of rates as returned by one successful refresh.
///
/// `1 base = rate × currency` for every entry. The base currency itself is
/// never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSnapshot {
    pub rates: HashMap<String, f64>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl RateSnapshot {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self {
            rates,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Thread-safe holder of the latest rate snapshot.
///
/// Readers clone the `Arc` of the current snapshot and work on it without
/// holding the lock. Writers swap in a whole new snapshot, so a reader sees
/// either the old table or the new one, never a mix.
pub struct RateStore {
    base: String,
    current: RwLock<Arc<RateSnapshot>>,
}

impl RateStore {
    pub fn new() -> Self {
        Self::with_base(BASE_CURRENCY)
    }

    pub fn with_base(base: &str) -> Self {
        Self {
            base: base.to_uppercase(),
            current: RwLock::new(Arc::new(RateSnapshot::default())),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn is_base(&self, code: &str) -> bool {
        self.base.eq_ignore_ascii_case(code)
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<RateSnapshot> {
        // A poisoned lock still guards a complete snapshot, the swap cannot
        // leave it half written.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Returns the rate of `code` against the base currency.
    pub fn get_rate(&self, code: &str) -> Result<f64, RateError> {
        if self.is_base(code) {
            return Ok(1.0);
        }

        let snapshot = self.snapshot();
        match snapshot.rates.get(&code.to_uppercase()) {
            Some(rate) => Ok(*rate),
            None => {
                debug!(currency = %code, "Rate lookup MISS");
                Err(RateError::UnknownCurrency(code.to_string()))
            }
        }
    }

    /// Replaces the whole table with `rates`.
    pub fn replace(&self, rates: HashMap<String, f64>) {
        let snapshot = Arc::new(RateSnapshot::new(rates));
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = snapshot;
    }
}

impl Default for RateStore {
    fn default() -> Self {
        Self::new()
    }
}
