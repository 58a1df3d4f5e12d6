//! Cross-rate conversion over the rate store

use crate::core::rates::{RateError, RateStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("{0}")]
    MissingInput(&'static str),
    #[error("Amount must be greater than zero.")]
    InvalidAmount(f64),
    #[error("Exchange rate unavailable for {}", .0.join(" or "))]
    UnknownCurrency(Vec<String>),
}

/// Raw conversion input as received at the boundary.
#[derive(Debug, Clone, Default)]
pub struct ConversionRequest {
    pub source: Option<String>,
    pub target: Option<String>,
    pub amount: Option<f64>,
}

/// A conversion request whose fields passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidConversion {
    pub source: String,
    pub target: String,
    pub amount: f64,
}

impl ConversionRequest {
    pub fn validate(self) -> Result<ValidConversion, ConversionError> {
        let source = non_blank(self.source);
        let target = non_blank(self.target);
        let (Some(source), Some(target)) = (source, target) else {
            return Err(ConversionError::MissingInput(
                "Source and target currencies must be provided.",
            ));
        };

        let amount = self
            .amount
            .ok_or(ConversionError::MissingInput("Amount must be provided."))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ConversionError::InvalidAmount(amount));
        }

        Ok(ValidConversion {
            source,
            target,
            amount,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Rounds half away from zero to two decimal places.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Clone)]
pub struct Converter {
    store: Arc<RateStore>,
}

impl Converter {
    pub fn new(store: Arc<RateStore>) -> Self {
        Self { store }
    }

    /// Converts `amount` of `source` into `target`, rounded to cents.
    pub fn convert(&self, source: &str, target: &str, amount: f64) -> Result<f64, ConversionError> {
        if source.eq_ignore_ascii_case(target) {
            debug!(
                currency = %source,
                amount,
                "Source and target currencies are the same, returning input amount"
            );
            return Ok(amount);
        }

        let source_rate = self.store.get_rate(source);
        let target_rate = self.store.get_rate(target);

        let (source_rate, target_rate) = match (source_rate, target_rate) {
            (Ok(s), Ok(t)) => (s, t),
            (s, t) => {
                let unknown = [s.err(), t.err()]
                    .into_iter()
                    .flatten()
                    .map(|RateError::UnknownCurrency(code)| code)
                    .collect::<Vec<_>>();
                warn!(?unknown, "Exchange rate unavailable");
                return Err(ConversionError::UnknownCurrency(unknown));
            }
        };

        let converted = round_to_cents((amount / source_rate) * target_rate);
        info!(
            %source,
            %target,
            amount,
            converted,
            "Converted amount"
        );
        Ok(converted)
    }

    pub fn convert_request(&self, request: &ValidConversion) -> Result<f64, ConversionError> {
        self.convert(&request.source, &request.target, request.amount)
    }
}
