use crate::rate_source::{fragment_from_object, RateNormalizer};
use serde_json::Value;
use twd_fx_common::{Currency, RateConvention, RateFragment, SourceError};

/// ExchangeRate-API 응답 정규화
///
/// 응답 형식: `{"base": "TWD", "rates": {"USD": 0.032, "JPY": 4.67, ...}}`
pub struct ExchangeRateApiNormalizer {
    convention: RateConvention,
}

impl ExchangeRateApiNormalizer {
    pub fn new(convention: RateConvention) -> Self {
        Self { convention }
    }
}

impl Default for ExchangeRateApiNormalizer {
    fn default() -> Self {
        Self::new(RateConvention::BaseToForeign)
    }
}

impl RateNormalizer for ExchangeRateApiNormalizer {
    fn normalize(&self, raw: &Value) -> Result<RateFragment, SourceError> {
        let rates = raw
            .get("rates")
            .and_then(Value::as_object)
            .ok_or_else(|| SourceError::Schema("missing `rates` object".to_string()))?;

        // 기준 통화가 다르면 환율을 그대로 쓸 수 없음
        match raw.get("base").and_then(Value::as_str) {
            Some(base) if base.eq_ignore_ascii_case(Currency::BASE.code()) => {}
            Some(base) => {
                return Err(SourceError::Schema(format!(
                    "base currency mismatch: expected {}, got {}",
                    Currency::BASE,
                    base
                )))
            }
            None => return Err(SourceError::Schema("missing `base` field".to_string())),
        }

        fragment_from_object(rates, |c| c.code().to_string(), self.convention)
    }
}
