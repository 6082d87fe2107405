use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;
use twd_fx_common::{
    ConverterConfig, Currency, RateConvention, RateFragment, SourceConfig, SourceError,
    SourceFormat,
};

use crate::exchangerate_api::ExchangeRateApiNormalizer;
use crate::fawaz::FawazNormalizer;

/// Fetches a JSON document from a rate endpoint
#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch_json(&self, endpoint: &Url) -> Result<Value, SourceError>;
}

/// Maps one source's raw payload to a fragment of canonical rates
/// ("1 base = X foreign").
///
/// Implementations must not panic on any input: a missing key, a wrong type
/// or an unusable number is reported as a `SourceError`.
pub trait RateNormalizer: Send + Sync {
    fn normalize(&self, raw: &Value) -> Result<RateFragment, SourceError>;
}

/// One remote endpoint plus the normalizer for its response layout
#[derive(Clone)]
pub struct RateSourceDescriptor {
    name: String,
    endpoint: Url,
    normalizer: Arc<dyn RateNormalizer>,
}

impl RateSourceDescriptor {
    pub fn new(name: impl Into<String>, endpoint: Url, normalizer: Arc<dyn RateNormalizer>) -> Self {
        Self {
            name: name.into(),
            endpoint,
            normalizer,
        }
    }

    pub fn from_config(config: &SourceConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&config.url)
            .map_err(|e| anyhow::anyhow!("Invalid url for source {}: {}", config.name, e))?;

        let normalizer: Arc<dyn RateNormalizer> = match config.format {
            SourceFormat::ExchangerateApi => {
                Arc::new(ExchangeRateApiNormalizer::new(config.convention))
            }
            SourceFormat::Fawaz => Arc::new(FawazNormalizer::new(config.convention)),
        };

        Ok(Self::new(config.name.clone(), endpoint, normalizer))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn normalize(&self, raw: &Value) -> Result<RateFragment, SourceError> {
        self.normalizer.normalize(raw)
    }
}

impl std::fmt::Debug for RateSourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateSourceDescriptor")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

/// Ordered list of rate sources. The first entry is preferred, the rest are
/// fallbacks in order.
#[derive(Debug, Clone, Default)]
pub struct RateSourceRegistry {
    sources: Vec<RateSourceDescriptor>,
}

impl RateSourceRegistry {
    pub fn new(sources: Vec<RateSourceDescriptor>) -> Self {
        Self { sources }
    }

    pub fn from_config(config: &ConverterConfig) -> anyhow::Result<Self> {
        let sources = config
            .sources
            .iter()
            .map(RateSourceDescriptor::from_config)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self::new(sources))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RateSourceDescriptor> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Reads the three foreign rates out of a JSON object.
///
/// `key_for` gives the key each currency is stored under. Values that are
/// missing, non-numeric, zero, negative or non-finite are left out so the
/// currently held rate survives the merge.
pub(crate) fn fragment_from_object(
    rates: &Map<String, Value>,
    key_for: fn(Currency) -> String,
    convention: RateConvention,
) -> Result<RateFragment, SourceError> {
    let mut fragment = RateFragment::new();

    for currency in Currency::FOREIGN {
        let key = key_for(currency);
        let Some(quoted) = rates.get(&key).and_then(Value::as_f64) else {
            debug!("{} missing or not a number in payload", key);
            continue;
        };

        if !fragment.insert(currency, convention.canonical(quoted)) {
            debug!("Dropping unusable rate for {}: {}", currency, quoted);
        }
    }

    if fragment.is_empty() {
        return Err(SourceError::InvalidRate(
            "payload has no positive finite rate".to_string(),
        ));
    }

    Ok(fragment)
}
