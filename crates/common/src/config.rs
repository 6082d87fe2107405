//! Runtime configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock two-source setup.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;
use crate::types::{Currency, RateConvention, RateSet};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STARTUP_DELAY_SECS: u64 = 2;

/// Response layouts we know how to normalize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// `{"base": "TWD", "rates": {"USD": ..}}`
    ExchangerateApi,
    /// `{"date": "..", "twd": {"usd": ..}}`
    Fawaz,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    pub format: SourceFormat,
    #[serde(default)]
    pub convention: RateConvention,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", deny_unknown_fields)]
pub struct DefaultRates {
    pub usd: f64,
    pub jpy: f64,
    pub cny: f64,
}

impl Default for DefaultRates {
    fn default() -> Self {
        let rates = RateSet::default();
        Self {
            usd: rates.rate(Currency::Usd),
            jpy: rates.rate(Currency::Jpy),
            cny: rates.rate(Currency::Cny),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// 환율 표의 기준 통화. TWD만 지원
    pub base: Currency,
    pub request_timeout_secs: u64,
    pub startup_delay_secs: u64,
    pub user_agent: String,
    pub default_rates: DefaultRates,
    pub sources: Vec<SourceConfig>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            base: Currency::BASE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            startup_delay_secs: DEFAULT_STARTUP_DELAY_SECS,
            user_agent: "twd-fx/0.1".to_string(),
            default_rates: DefaultRates::default(),
            sources: default_sources(),
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "ExchangeRate-API".to_string(),
            url: "https://api.exchangerate-api.com/v4/latest/TWD".to_string(),
            format: SourceFormat::ExchangerateApi,
            convention: RateConvention::BaseToForeign,
        },
        SourceConfig {
            name: "Fawaz Exchange API".to_string(),
            url: "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies/twd.json"
                .to_string(),
            format: SourceFormat::Fawaz,
            convention: RateConvention::BaseToForeign,
        },
    ]
}

impl ConverterConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        info!(
            "Loaded config from {} ({} sources)",
            path.display(),
            config.sources.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base != Currency::BASE {
            return Err(ConfigError::Invalid(format!(
                "base must be {}, got {}",
                Currency::BASE,
                self.base
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if let Some(source) = self.sources.iter().find(|s| s.name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "source with url {} has an empty name",
                source.url
            )));
        }
        self.default_rate_set()?;
        Ok(())
    }

    pub fn default_rate_set(&self) -> Result<RateSet, ConfigError> {
        let d = &self.default_rates;
        Ok(RateSet::new(d.usd, d.jpy, d.cny)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ConverterConfig::from_toml_str("").unwrap();

        assert_eq!(config, ConverterConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].name, "ExchangeRate-API");
        assert_eq!(config.sources[1].format, SourceFormat::Fawaz);
    }

    #[test]
    fn test_parse_custom_sources() {
        let raw = r#"
            base = "TWD"
            request_timeout_secs = 5

            [default_rates]
            USD = 0.031
            JPY = 4.5
            CNY = 0.22

            [[sources]]
            name = "mirror"
            url = "http://localhost:8080/twd.json"
            format = "fawaz"
            convention = "foreign_to_base"
        "#;

        let config = ConverterConfig::from_toml_str(raw).unwrap();

        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].convention, RateConvention::ForeignToBase);
        let rates = config.default_rate_set().unwrap();
        assert_eq!(rates.rate(Currency::Jpy), 4.5);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = ConverterConfig::from_toml_str("request_timeout_secs = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_default_rate() {
        let raw = r#"
            [default_rates]
            USD = 0.0
            JPY = 4.5
            CNY = 0.22
        "#;
        assert!(matches!(
            ConverterConfig::from_toml_str(raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_format() {
        let raw = r#"
            [[sources]]
            name = "x"
            url = "http://localhost"
            format = "yahoo"
        "#;
        assert!(matches!(
            ConverterConfig::from_toml_str(raw),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_rejects_other_base_currency() {
        let result = ConverterConfig::from_toml_str(r#"base = "USD""#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        // 오타난 키가 기본값으로 조용히 바뀌지 않아야 함
        let top_level = ConverterConfig::from_toml_str("request_timeout = 0");
        let rates = ConverterConfig::from_toml_str(
            r#"
            [default_rates]
            USD = 0.032
            JPY = 4.67
            CNY = 0.23
            EUR = 0.029
        "#,
        );
        let source = ConverterConfig::from_toml_str(
            r#"
            [[sources]]
            name = "x"
            url = "http://localhost"
            format = "fawaz"
            timeout = 3
        "#,
        );

        assert!(matches!(top_level, Err(ConfigError::Toml(_))));
        assert!(matches!(rates, Err(ConfigError::Toml(_))));
        assert!(matches!(source, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_load_from_file() {
        // Given
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twd-fx.toml");
        std::fs::write(&path, "base = \"TWD\"\nstartup_delay_secs = 0\n").unwrap();

        // When
        let config = ConverterConfig::load(&path).unwrap();

        // Then
        assert_eq!(config.startup_delay(), Duration::ZERO);
        assert_eq!(config.sources, default_sources());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = ConverterConfig::load(dir.path().join("missing.toml"));

        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
