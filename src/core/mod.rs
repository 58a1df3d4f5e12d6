//! Core business logic abstractions

pub mod config;
pub mod converter;
pub mod currency;
pub mod log;
pub mod rates;
pub mod refresh;
pub mod scheduler;

// Re-export main types for cleaner imports
pub use converter::{ConversionError, ConversionRequest, Converter};
pub use currency::{QuoteProvider, RefreshError};
pub use rates::{BASE_CURRENCY, RateError, RateSnapshot, RateStore};
pub use refresh::RateRefresher;
pub use scheduler::{RefreshScheduler, SchedulerHandle};
