//! 납기 계산기
//!
//! 오늘 날짜와 납기일 사이의 일수, 일수로부터 납기일, 그리고 단순화된 영업일 수를
//! 계산합니다.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("date out of range: {today} + {days} days")]
    OutOfRange { today: NaiveDate, days: i64 },
}

/// 두 날짜 사이의 일수 (납기일이 과거면 음수)
pub fn days_between(today: NaiveDate, delivery: NaiveDate) -> i64 {
    (delivery - today).num_days()
}

/// 오늘로부터 `days`일 뒤의 날짜
pub fn delivery_from_days(today: NaiveDate, days: i64) -> Result<NaiveDate, DeliveryError> {
    let shifted = if days >= 0 {
        today.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.ok_or(DeliveryError::OutOfRange { today, days })
}

/// 영업일 수 (주말 제외, 간이 계산)
///
/// 완전한 주는 5일로 세고, 남은 날은 최대 5일까지 인정합니다. 공휴일은 고려하지
/// 않습니다.
pub fn work_days(total_days: i64) -> i64 {
    if total_days <= 0 {
        return 0;
    }
    let weeks = total_days / 7;
    let remaining = total_days % 7;
    weeks * 5 + remaining.min(5)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryEstimate {
    pub today: NaiveDate,
    pub delivery: NaiveDate,
    pub days: i64,
    pub work_days: i64,
}

impl DeliveryEstimate {
    pub fn from_dates(today: NaiveDate, delivery: NaiveDate) -> Self {
        let days = days_between(today, delivery);
        Self {
            today,
            delivery,
            days,
            work_days: work_days(days),
        }
    }

    pub fn from_days(today: NaiveDate, days: i64) -> Result<Self, DeliveryError> {
        let delivery = delivery_from_days(today, days)?;
        Ok(Self {
            today,
            delivery,
            days,
            work_days: work_days(days),
        })
    }
}
