//! Priced call model
//!
//! A reconciled Start/End pair with its price. Once stored, a priced call
//! is reused as-is by later bill runs.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Priced call entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedCall {
    /// Storage identifier
    pub id: Option<i64>,

    /// Bill this call was first stored with
    pub bill_id: Option<i64>,

    /// Called number
    pub destination_number: String,

    /// Call identifier shared by the Start/End records
    pub call_identifier: i64,

    /// Start record timestamp
    pub call_start: NaiveDateTime,

    /// End record timestamp
    pub call_end: NaiveDateTime,

    /// Whole seconds between start and end
    pub duration_seconds: i64,

    /// Total price (standing charge plus per-minute charges)
    pub price: Decimal,
}

impl PricedCall {
    /// Create an unsaved priced call
    pub fn new(
        destination_number: impl Into<String>,
        call_identifier: i64,
        call_start: NaiveDateTime,
        call_end: NaiveDateTime,
        price: Decimal,
    ) -> Self {
        Self {
            id: None,
            bill_id: None,
            destination_number: destination_number.into(),
            call_identifier,
            call_start,
            call_end,
            duration_seconds: (call_end - call_start).num_seconds(),
            price,
        }
    }

    /// Duration as `H:MM:SS`; hours are not wrapped at 24
    pub fn formatted_duration(&self) -> String {
        let total = self.duration_seconds.max(0);
        format!(
            "{}:{:02}:{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 12, d)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_duration_from_instants() {
        let call = PricedCall::new("9993468278", 70, at(12, 15, 7, 13), at(12, 15, 14, 56), dec!(0.99));
        assert_eq!(call.duration_seconds, 463);
        assert_eq!(call.formatted_duration(), "0:07:43");
    }

    #[test]
    fn test_formatted_duration_past_one_day() {
        let call = PricedCall::new("9993468278", 74, at(12, 21, 57, 13), at(13, 22, 10, 56), dec!(86.94));
        assert_eq!(call.formatted_duration(), "24:13:43");
    }

    #[test]
    fn test_zero_duration() {
        let call = PricedCall::new("9993468278", 1, at(11, 19, 22, 16), at(11, 19, 22, 16), dec!(0.36));
        assert_eq!(call.formatted_duration(), "0:00:00");
    }
}
