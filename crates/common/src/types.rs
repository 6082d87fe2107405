use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RateError;

/// Currencies handled by the converter. TWD is the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Twd,
    Usd,
    Jpy,
    Cny,
}

impl Currency {
    pub const BASE: Currency = Currency::Twd;
    pub const ALL: [Currency; 4] = [Currency::Twd, Currency::Usd, Currency::Jpy, Currency::Cny];
    pub const FOREIGN: [Currency; 3] = [Currency::Usd, Currency::Jpy, Currency::Cny];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Twd => "TWD",
            Currency::Usd => "USD",
            Currency::Jpy => "JPY",
            Currency::Cny => "CNY",
        }
    }

    /// Decimal places shown for amounts in this currency
    pub fn display_decimals(&self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }

    pub fn is_base(&self) -> bool {
        *self == Currency::BASE
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TWD" => Ok(Currency::Twd),
            "USD" => Ok(Currency::Usd),
            "JPY" => Ok(Currency::Jpy),
            "CNY" => Ok(Currency::Cny),
            _ => Err(RateError::UnknownCurrency(s.to_string())),
        }
    }
}

/// A rate is usable only if it is positive and finite.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Rates relative to the base currency: 1 TWD = rate units of the target.
///
/// The base rate is not stored; `rate(Currency::Twd)` is always 1.
/// Every stored rate is positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateSet {
    usd: f64,
    jpy: f64,
    cny: f64,
}

impl RateSet {
    pub fn new(usd: f64, jpy: f64, cny: f64) -> Result<Self, RateError> {
        let mut rates = Self::default();
        rates.set(Currency::Usd, usd)?;
        rates.set(Currency::Jpy, jpy)?;
        rates.set(Currency::Cny, cny)?;
        Ok(rates)
    }

    pub fn rate(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Twd => 1.0,
            Currency::Usd => self.usd,
            Currency::Jpy => self.jpy,
            Currency::Cny => self.cny,
        }
    }

    pub fn set(&mut self, currency: Currency, rate: f64) -> Result<(), RateError> {
        if !is_valid_rate(rate) {
            return Err(RateError::Invalid { currency, rate });
        }
        let slot = match currency {
            Currency::Twd => return Err(RateError::BaseCurrency(currency)),
            Currency::Usd => &mut self.usd,
            Currency::Jpy => &mut self.jpy,
            Currency::Cny => &mut self.cny,
        };
        *slot = rate;
        Ok(())
    }

    /// Field-wise override. Currencies absent from the fragment keep their rate.
    pub fn merge(&mut self, fragment: &RateFragment) {
        for (currency, rate) in fragment.iter() {
            // RateFragment only holds validated foreign rates
            let _ = self.set(currency, rate);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        Currency::ALL.into_iter().map(move |c| (c, self.rate(c)))
    }
}

impl Default for RateSet {
    /// Hardcoded rates used until a source answers
    fn default() -> Self {
        Self {
            usd: 0.032,
            jpy: 4.67,
            cny: 0.23,
        }
    }
}

/// Partial rate set produced by a normalizer.
///
/// Only foreign currencies with a positive finite rate get in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateFragment {
    rates: BTreeMap<Currency, f64>,
}

impl RateFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the value was dropped.
    pub fn insert(&mut self, currency: Currency, rate: f64) -> bool {
        if currency.is_base() || !is_valid_rate(rate) {
            return false;
        }
        self.rates.insert(currency, rate);
        true
    }

    pub fn get(&self, currency: Currency) -> Option<f64> {
        self.rates.get(&currency).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        self.rates.iter().map(|(c, r)| (*c, *r))
    }
}

/// How a source quotes its numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateConvention {
    /// 1 base = X foreign (the internal representation)
    #[default]
    BaseToForeign,
    /// 1 foreign = X base
    ForeignToBase,
}

impl RateConvention {
    /// Converts a quoted value into "1 base = X foreign".
    pub fn canonical(&self, quoted: f64) -> f64 {
        match self {
            RateConvention::BaseToForeign => quoted,
            RateConvention::ForeignToBase => 1.0 / quoted,
        }
    }
}

/// Where the rates currently in use came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum DataSource {
    /// Hardcoded or stale rates
    #[default]
    Default,
    /// Winning source of the last acquisition
    Live(String),
    /// Edited by the user
    Manual,
}

impl DataSource {
    pub fn is_live(&self) -> bool {
        matches!(self, DataSource::Live(_))
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Default => f.write_str("default rates"),
            DataSource::Live(name) => write!(f, "live: {}", name),
            DataSource::Manual => f.write_str("manual"),
        }
    }
}

/// Outcome of one pass over the source registry.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionResult {
    Success { fragment: RateFragment, source: String },
    AllSourcesFailed,
}

impl AcquisitionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AcquisitionResult::Success { .. })
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            AcquisitionResult::Success { source, .. } => Some(source),
            AcquisitionResult::AllSourcesFailed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_rate_is_always_one() {
        let rates = RateSet::default();
        assert_eq!(rates.rate(Currency::Twd), 1.0);

        let mut rates = rates;
        assert_eq!(
            rates.set(Currency::Twd, 2.0),
            Err(RateError::BaseCurrency(Currency::Twd))
        );
        assert_eq!(rates.rate(Currency::Twd), 1.0);
    }

    #[test]
    fn test_set_rejects_zero_and_non_finite() {
        let mut rates = RateSet::default();

        for bad in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(rates.set(Currency::Usd, bad).is_err(), "{} accepted", bad);
        }
        assert_eq!(rates.rate(Currency::Usd), 0.032);
    }

    #[test]
    fn test_fragment_drops_invalid_values() {
        let mut fragment = RateFragment::new();

        assert!(fragment.insert(Currency::Usd, 0.031));
        assert!(!fragment.insert(Currency::Jpy, 0.0));
        assert!(!fragment.insert(Currency::Cny, f64::INFINITY));
        assert!(!fragment.insert(Currency::Twd, 1.0));

        assert_eq!(fragment.len(), 1);
        assert_eq!(fragment.get(Currency::Usd), Some(0.031));
        assert_eq!(fragment.get(Currency::Jpy), None);
    }

    #[test]
    fn test_merge_keeps_missing_currencies() {
        let mut rates = RateSet::default();
        let mut fragment = RateFragment::new();
        fragment.insert(Currency::Usd, 0.031);
        fragment.insert(Currency::Jpy, 4.8);

        rates.merge(&fragment);

        assert_eq!(rates.rate(Currency::Usd), 0.031);
        assert_eq!(rates.rate(Currency::Jpy), 4.8);
        assert_eq!(rates.rate(Currency::Cny), 0.23);
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("usd".parse::<Currency>(), Ok(Currency::Usd));
        assert_eq!(" JPY ".parse::<Currency>(), Ok(Currency::Jpy));
        assert!("EUR".parse::<Currency>().is_err());
    }

    #[test]
    fn test_convention_inverts_foreign_quotes() {
        assert_eq!(RateConvention::BaseToForeign.canonical(0.032), 0.032);
        assert_eq!(RateConvention::ForeignToBase.canonical(32.0), 1.0 / 32.0);
    }

    #[test]
    fn test_data_source_label() {
        assert_eq!(DataSource::Default.to_string(), "default rates");
        assert_eq!(
            DataSource::Live("Fawaz Exchange API".into()).to_string(),
            "live: Fawaz Exchange API"
        );
        assert_eq!(DataSource::Manual.to_string(), "manual");
        assert!(!DataSource::Manual.is_live());
    }
}
