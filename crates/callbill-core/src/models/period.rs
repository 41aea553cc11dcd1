//! Billing period model
//!
//! A calendar month identified as `MM/YYYY`.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::AppError;

/// Last year a period may fall in
const MAX_YEAR: i32 = 9999;

/// Calendar month a bill covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BillingPeriod {
    first_day: NaiveDate,
}

impl BillingPeriod {
    /// Create a period from month (1-12) and a four-digit year (1-9999)
    pub fn new(month: u32, year: i32) -> Result<Self, AppError> {
        if !(1..=MAX_YEAR).contains(&year) {
            return Err(AppError::InvalidInput(format!(
                "Invalid period year: {}",
                year
            )));
        }

        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid period month: {}", month)))
    }

    /// The period containing a date
    pub fn of(date: NaiveDate) -> Self {
        Self {
            first_day: date - Days::new(u64::from(date.day0())),
        }
    }

    /// The most recent month that has fully ended before `today`
    pub fn last_closed(today: NaiveDate) -> Self {
        Self::of(today).previous()
    }

    /// A period is closed once `today` lies in a later month
    pub fn is_closed(&self, today: NaiveDate) -> bool {
        *self < Self::of(today)
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn next(&self) -> Self {
        Self {
            first_day: self.first_day + Months::new(1),
        }
    }

    pub fn previous(&self) -> Self {
        Self {
            first_day: self.first_day - Months::new(1),
        }
    }

    /// First instant of the period
    pub fn starts_at(&self) -> NaiveDateTime {
        self.first_day.and_time(NaiveTime::MIN)
    }

    /// First instant after the period
    pub fn ends_before(&self) -> NaiveDateTime {
        self.next().starts_at()
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.starts_at() <= instant && instant < self.ends_before()
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month(), self.year())
    }
}

impl FromStr for BillingPeriod {
    type Err = AppError;

    /// Parse `MM/YYYY`; surrounding whitespace and one-digit months are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidInput(format!("Invalid period '{}', expected MM/YYYY", s));

        let mut parts = s.split('/');
        let (month, year) = match (parts.next(), parts.next(), parts.next()) {
            (Some(month), Some(year), None) => (month.trim(), year.trim()),
            _ => return Err(invalid()),
        };

        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;

        Self::new(month, year).map_err(|_| invalid())
    }
}

impl Serialize for BillingPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BillingPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
