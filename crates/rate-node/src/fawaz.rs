use crate::rate_source::{fragment_from_object, RateNormalizer};
use serde_json::Value;
use twd_fx_common::{Currency, RateConvention, RateFragment, SourceError};

/// Normalizer for the fawazahmed0 currency API.
///
/// The payload nests rates under the lower-case base code:
/// `{"date": "2025-06-02", "twd": {"usd": 0.0334, "jpy": 4.79, ...}}`
pub struct FawazNormalizer {
    convention: RateConvention,
}

impl FawazNormalizer {
    pub fn new(convention: RateConvention) -> Self {
        Self { convention }
    }
}

impl Default for FawazNormalizer {
    fn default() -> Self {
        Self::new(RateConvention::BaseToForeign)
    }
}

fn lower_code(currency: Currency) -> String {
    currency.code().to_ascii_lowercase()
}

impl RateNormalizer for FawazNormalizer {
    fn normalize(&self, raw: &Value) -> Result<RateFragment, SourceError> {
        let base_key = lower_code(Currency::BASE);
        let rates = raw
            .get(&base_key)
            .and_then(Value::as_object)
            .ok_or_else(|| SourceError::Schema(format!("missing `{}` object", base_key)))?;

        fragment_from_object(rates, lower_code, self.convention)
    }
}
