//! Call pricing
//!
//! Price = standing charge of the band active at call start, plus each
//! segment's whole minutes at its band's minute charge.

use callbill_core::{
    models::{CallRecord, PricedCall, TariffBand, TariffSchedule},
    AppError, AppResult,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::banding::{BandSplit, BandSplitter};

/// Price of a call together with its band split
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub price: Decimal,
    pub split: BandSplit,
}

/// Prices calls against an immutable tariff schedule
#[derive(Debug, Clone)]
pub struct TariffPricer {
    schedule: TariffSchedule,
}

impl TariffPricer {
    pub fn new(schedule: TariffSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &TariffSchedule {
        &self.schedule
    }

    /// Price the call `start..end`
    pub fn price(&self, start: NaiveDateTime, end: NaiveDateTime) -> AppResult<Decimal> {
        self.quote(start, end).map(|quote| quote.price)
    }

    /// Price the call `start..end` and return the band split used
    pub fn quote(&self, start: NaiveDateTime, end: NaiveDateTime) -> AppResult<PriceQuote> {
        let split = BandSplitter::new(&self.schedule).split(start, end)?;

        let standing = self.schedule.rate(split.opening_band).standing_charge;
        let price = [TariffBand::Standard, TariffBand::Reduced]
            .into_iter()
            .fold(standing, |acc, band| {
                acc + Decimal::from(split.minutes_in(band)) * self.schedule.rate(band).minute_charge
            });

        Ok(PriceQuote { price, split })
    }

    /// Build an unsaved priced call from a matched Start/End pair
    ///
    /// # Errors
    /// `InvalidInput` when the records are not a Start/End pair of the same
    /// call or the End precedes the Start, `MissingField` when the Start
    /// record has no destination number.
    pub fn price_call(&self, start: &CallRecord, end: &CallRecord) -> AppResult<PricedCall> {
        if !start.is_start() || !end.is_end() || start.call_identifier != end.call_identifier {
            return Err(AppError::InvalidInput(format!(
                "Records {} ({}) and {} ({}) are not a start/end pair",
                start.call_identifier, start.kind, end.call_identifier, end.kind
            )));
        }

        let destination = start
            .destination_number
            .as_deref()
            .ok_or_else(|| AppError::MissingField("destination_number".to_string()))?;

        let price = self.price(start.timestamp, end.timestamp)?;
        debug!(
            call_id = start.call_identifier,
            %price,
            "Priced call"
        );

        Ok(PricedCall::new(
            destination,
            start.call_identifier,
            start.timestamp,
            end.timestamp,
            price,
        ))
    }
}

impl Default for TariffPricer {
    fn default() -> Self {
        Self::new(TariffSchedule::default())
    }
}
