//! Tariff quote DTOs

use callbill_core::models::{CallRecord, TariffBand, TariffSchedule};
use callbill_core::AppError;
use callbill_services::{BandSegment, PriceQuote};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{invalid_field, mandatory_field};

/// Quote request: a hypothetical call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteRequest {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl QuoteRequest {
    /// Parse both instants, reporting every invalid field
    pub fn instants(&self) -> Result<(NaiveDateTime, NaiveDateTime), AppError> {
        let mut messages = Vec::new();

        let mut parse = |field: &str, value: &Option<String>| match value.as_deref() {
            None => {
                messages.push(mandatory_field(field));
                None
            }
            Some(text) => {
                let parsed = CallRecord::parse_timestamp(text);
                if parsed.is_none() {
                    messages.push(invalid_field(field));
                }
                parsed
            }
        };

        let start = parse("start", &self.start);
        let end = parse("end", &self.end);

        match (start, end) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(AppError::Validation(messages.join(" "))),
        }
    }
}

/// One band segment of a quote
#[derive(Debug, Clone, Serialize)]
pub struct SegmentResponse {
    pub band: TariffBand,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub minutes: i64,
    /// Minutes times the band's minute charge
    #[serde(with = "rust_decimal::serde::float")]
    pub charge: Decimal,
}

impl SegmentResponse {
    fn new(segment: &BandSegment, schedule: &TariffSchedule) -> Self {
        Self {
            band: segment.band,
            start: segment.start,
            end: segment.end,
            minutes: segment.minutes,
            charge: Decimal::from(segment.minutes) * schedule.rate(segment.band).minute_charge,
        }
    }
}

/// Price of a hypothetical call with its breakdown
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    pub opening_band: TariffBand,
    #[serde(with = "rust_decimal::serde::float")]
    pub standing_charge: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub segments: Vec<SegmentResponse>,
}

impl QuoteResponse {
    pub fn new(quote: &PriceQuote, schedule: &TariffSchedule) -> Self {
        Self {
            opening_band: quote.split.opening_band,
            standing_charge: schedule.rate(quote.split.opening_band).standing_charge,
            price: quote.price,
            segments: quote
                .split
                .segments
                .iter()
                .map(|segment| SegmentResponse::new(segment, schedule))
                .collect(),
        }
    }
}
