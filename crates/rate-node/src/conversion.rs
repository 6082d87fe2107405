use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use twd_fx_common::{Currency, RateSet};

/// UTC+8, used for the "last updated" display
const TAIWAN_OFFSET_SECS: i32 = 8 * 3600;

/// 사용자가 입력한 금액 (어느 통화 칸에 값이 있는지)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConversionInput {
    pub currency: Currency,
    pub amount: f64,
}

impl ConversionInput {
    /// 음수, NaN, 무한대는 입력으로 받지 않음
    pub fn new(currency: Currency, amount: f64) -> Option<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        // -0 은 0 으로
        Some(Self {
            currency,
            amount: amount + 0.0,
        })
    }

    /// 입력 칸의 텍스트를 해석. 빈 값이나 숫자가 아니면 None
    pub fn parse(currency: Currency, text: &str) -> Option<Self> {
        let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return None;
        }
        let amount = cleaned.parse::<f64>().ok()?;
        Self::new(currency, amount)
    }
}

/// 한 통화 금액을 모든 통화로 환산한 결과
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConversionTable {
    pub input: ConversionInput,
    amounts: [f64; 4],
}

impl ConversionTable {
    pub fn amount(&self, currency: Currency) -> f64 {
        self.amounts[index(currency)]
    }

    pub fn formatted(&self, currency: Currency) -> String {
        format_amount(currency, self.amount(currency))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, f64)> + '_ {
        Currency::ALL.into_iter().map(move |c| (c, self.amount(c)))
    }
}

fn index(currency: Currency) -> usize {
    match currency {
        Currency::Twd => 0,
        Currency::Usd => 1,
        Currency::Jpy => 2,
        Currency::Cny => 3,
    }
}

/// 기준 통화(TWD)를 거쳐 환산: amount / rate(from) * rate(to)
pub fn convert(rates: &RateSet, from: Currency, amount: f64, to: Currency) -> f64 {
    if from == to {
        return amount;
    }
    let base_amount = amount / rates.rate(from);
    base_amount * rates.rate(to)
}

pub fn convert_all(rates: &RateSet, input: ConversionInput) -> ConversionTable {
    let mut amounts = [0.0; 4];
    for currency in Currency::ALL {
        amounts[index(currency)] = convert(rates, input.currency, input.amount, currency);
    }
    ConversionTable { input, amounts }
}

/// Rounds half away from zero to `decimals` places.
///
/// The exact binary value is rounded (`Decimal::from_f64_retain`), so
/// 1.005 shows as 1.00.
fn format_fixed(value: f64, decimals: u32) -> String {
    if !value.is_finite() {
        return String::new();
    }

    match Decimal::from_f64_retain(value) {
        Some(decimal) => {
            let mut rounded =
                decimal.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(decimals);
            if rounded.is_zero() {
                rounded.set_sign_positive(true);
            }
            rounded.to_string()
        }
        // Decimal 범위를 넘는 값
        None => format!("{:.*}", decimals as usize, value),
    }
}

/// 표시용 금액. JPY는 소수점 없이, 나머지는 소수점 2자리
pub fn format_amount(currency: Currency, amount: f64) -> String {
    format_fixed(amount, currency.display_decimals())
}

/// `1 TWD = 0.0320 USD` 형태의 환율 라벨
pub fn format_rate_label(currency: Currency, rate: f64) -> String {
    if currency.is_base() {
        return format!("{} (base)", currency);
    }
    let decimals = match currency {
        Currency::Jpy => 2,
        _ => 4,
    };
    format!(
        "1 {} = {} {}",
        Currency::BASE,
        format_fixed(rate, decimals),
        currency
    )
}

/// 대만 시간(UTC+8) 기준 `YYYY/MM/DD HH:MM`
pub fn format_update_time(at: DateTime<Utc>) -> String {
    const FORMAT: &str = "%Y/%m/%d %H:%M";
    match FixedOffset::east_opt(TAIWAN_OFFSET_SECS) {
        Some(offset) => at.with_timezone(&offset).format(FORMAT).to_string(),
        None => at.format(FORMAT).to_string(),
    }
}
