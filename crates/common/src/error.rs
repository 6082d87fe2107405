use thiserror::Error;

use crate::types::Currency;

/// Why a single rate source could not be used.
///
/// Every variant is handled the same way by the acquisition controller: the
/// failure is logged and the next source is tried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    /// Unreachable host, non-2xx status or timeout
    #[error("network error: {0}")]
    Network(String),

    /// Body was not valid JSON
    #[error("malformed response: {0}")]
    Parse(String),

    /// Well-formed JSON without the expected shape
    #[error("unexpected response shape: {0}")]
    Schema(String),

    /// No positive finite rate left after validation
    #[error("no usable rate: {0}")]
    InvalidRate(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RateError {
    #[error("the base currency {0} always has rate 1")]
    BaseCurrency(Currency),

    #[error("invalid rate for {currency}: {rate}")]
    Invalid { currency: Currency, rate: f64 },

    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<RateError> for ConfigError {
    fn from(err: RateError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}
