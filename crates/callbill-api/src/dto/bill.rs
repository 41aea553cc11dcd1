//! Bill DTOs

use callbill_core::{
    models::{is_valid_phone_number, Bill, BillingPeriod, PricedCall},
    AppError,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{invalid_field, mandatory_field};

/// Query parameters of the bill endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhoneBillQuery {
    /// Subscriber phone number
    pub subscriber: Option<String>,

    /// `MM/YYYY`; defaults to the last closed period
    pub period: Option<String>,
}

impl PhoneBillQuery {
    /// Resolve the subscriber and a closed period relative to `today`
    ///
    /// # Errors
    /// `Validation` for a missing or malformed field, `OpenPeriod` when the
    /// period has not ended yet.
    pub fn resolve(&self, today: NaiveDate) -> Result<(String, BillingPeriod), AppError> {
        let mut messages = Vec::new();

        let subscriber = match self.subscriber.as_deref().map(str::trim) {
            None | Some("") => {
                messages.push(mandatory_field("subscriber"));
                None
            }
            Some(number) if !is_valid_phone_number(number) => {
                messages.push(invalid_field("subscriber"));
                None
            }
            Some(number) => Some(number.to_string()),
        };

        let period = match self.period.as_deref().map(str::trim) {
            None | Some("") => Some(BillingPeriod::last_closed(today)),
            Some(value) => match value.parse::<BillingPeriod>() {
                Ok(period) => Some(period),
                Err(_) => {
                    messages.push(invalid_field("period"));
                    None
                }
            },
        };

        match (subscriber, period) {
            (Some(subscriber), Some(period)) => {
                if !period.is_closed(today) {
                    return Err(AppError::OpenPeriod(period.to_string()));
                }
                Ok((subscriber, period))
            }
            _ => Err(AppError::Validation(messages.join(" "))),
        }
    }
}

/// Priced call as shown on a bill
#[derive(Debug, Clone, Serialize)]
pub struct PricedCallResponse {
    pub destination_number: String,
    pub call_identifier: i64,
    pub call_start: NaiveDateTime,
    pub call_end: NaiveDateTime,
    /// `H:MM:SS`
    pub duration: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<&PricedCall> for PricedCallResponse {
    fn from(call: &PricedCall) -> Self {
        Self {
            destination_number: call.destination_number.clone(),
            call_identifier: call.call_identifier,
            call_start: call.call_start,
            call_end: call.call_end,
            duration: call.formatted_duration(),
            price: call.price,
        }
    }
}

/// Subscriber bill
#[derive(Debug, Clone, Serialize)]
pub struct BillResponse {
    pub subscriber: String,
    pub period: BillingPeriod,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub calls: Vec<PricedCallResponse>,
}

impl From<&Bill> for BillResponse {
    fn from(bill: &Bill) -> Self {
        Self {
            subscriber: bill.subscriber.clone(),
            period: bill.period,
            total: bill.total(),
            calls: bill.calls().iter().map(Into::into).collect(),
        }
    }
}
