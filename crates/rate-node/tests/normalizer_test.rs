use rate_node::exchangerate_api::ExchangeRateApiNormalizer;
use rate_node::fawaz::FawazNormalizer;
use rate_node::{RateNormalizer, RateSourceRegistry};
use serde_json::{json, Value};
use twd_fx_common::{ConverterConfig, Currency, RateConvention, RateSet, SourceError};

fn normalizers() -> Vec<(&'static str, Box<dyn RateNormalizer>)> {
    vec![
        (
            "exchangerate_api",
            Box::new(ExchangeRateApiNormalizer::default()) as Box<dyn RateNormalizer>,
        ),
        ("fawaz", Box::new(FawazNormalizer::default()) as Box<dyn RateNormalizer>),
    ]
}

/// 예상하지 못한 형태의 응답들
fn hostile_payloads() -> Vec<Value> {
    vec![
        json!(null),
        json!(true),
        json!(42),
        json!("TWD"),
        json!([]),
        json!({}),
        json!({ "rates": null, "base": "TWD" }),
        json!({ "rates": [0.032, 4.67], "base": "TWD" }),
        json!({ "rates": {}, "base": "TWD" }),
        json!({ "rates": { "USD": 0.032 }, "base": 1 }),
        json!({ "twd": null }),
        json!({ "twd": "0.032" }),
        json!({ "twd": {} }),
        json!({ "twd": { "usd": {}, "jpy": [], "cny": null } }),
        json!({ "twd": { "usd": 0, "jpy": -4.67, "cny": 0.0 } }),
    ]
}

#[test]
fn test_hostile_payloads_are_rejected_without_panicking() {
    for (name, normalizer) in normalizers() {
        for payload in hostile_payloads() {
            // When
            let result = normalizer.normalize(&payload);

            // Then
            assert!(
                result.is_err(),
                "{} accepted {}: {:?}",
                name,
                payload,
                result
            );
        }
    }
}

#[test]
fn test_missing_top_level_key_is_schema_error() {
    let exchangerate = ExchangeRateApiNormalizer::default().normalize(&json!({ "base": "TWD" }));
    let fawaz = FawazNormalizer::default().normalize(&json!({ "date": "2025-06-02" }));

    assert!(matches!(exchangerate, Err(SourceError::Schema(_))));
    assert!(matches!(fawaz, Err(SourceError::Schema(_))));
}

#[test]
fn test_invalid_values_never_reach_the_rate_set() {
    // Given - USD, CNY는 0이라 역수 변환 시 무한대가 됨
    let payload = json!({ "base": "TWD", "rates": { "USD": 0.0, "JPY": 0.2, "CNY": 0.0 } });
    let mut rates = RateSet::default();
    let before = rates;

    // When
    let fragment = ExchangeRateApiNormalizer::new(RateConvention::ForeignToBase)
        .normalize(&payload)
        .unwrap();
    rates.merge(&fragment);

    // Then
    assert_eq!(rates.rate(Currency::Usd), before.rate(Currency::Usd));
    assert_eq!(rates.rate(Currency::Cny), before.rate(Currency::Cny));
    assert_eq!(rates.rate(Currency::Jpy), 5.0);
    for (currency, rate) in rates.iter() {
        assert!(rate.is_finite() && rate > 0.0, "{} = {}", currency, rate);
    }
}

#[test]
fn test_both_layouts_agree_on_same_rates() {
    // Given - 같은 환율을 두 가지 형식으로
    let exchangerate = json!({
        "base": "TWD",
        "rates": { "USD": 0.0334, "JPY": 4.79, "CNY": 0.24 }
    });
    let fawaz = json!({
        "date": "2025-06-02",
        "twd": { "usd": 0.0334, "jpy": 4.79, "cny": 0.24 }
    });

    // When
    let a = ExchangeRateApiNormalizer::default().normalize(&exchangerate).unwrap();
    let b = FawazNormalizer::default().normalize(&fawaz).unwrap();

    // Then
    assert_eq!(a, b);
}

#[test]
fn test_configured_registry_uses_matching_normalizers() {
    // Given - 기본 설정 (ExchangeRate-API, Fawaz 순서)
    let registry = RateSourceRegistry::from_config(&ConverterConfig::default()).unwrap();
    let descriptors: Vec<_> = registry.iter().collect();

    // When & Then - 각 소스는 자기 형식만 해석
    let exchangerate = json!({ "base": "TWD", "rates": { "USD": 0.032 } });
    let fawaz = json!({ "twd": { "usd": 0.032 } });

    assert!(descriptors[0].normalize(&exchangerate).is_ok());
    assert!(descriptors[0].normalize(&fawaz).is_err());
    assert!(descriptors[1].normalize(&fawaz).is_ok());
    assert!(descriptors[1].normalize(&exchangerate).is_err());
}
