//! Bill model
//!
//! One subscriber's priced calls for one calendar month.

use rust_decimal::Decimal;
use serde::Serialize;

use super::{BillingPeriod, PricedCall};

/// Subscriber bill
///
/// The total is always derived from the call list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    /// Storage identifier
    pub id: Option<i64>,

    /// Subscriber phone number
    pub subscriber: String,

    /// Billed month
    pub period: BillingPeriod,

    total: Decimal,
    calls: Vec<PricedCall>,
}

impl Bill {
    pub fn new(subscriber: impl Into<String>, period: BillingPeriod, calls: Vec<PricedCall>) -> Self {
        let mut bill = Self {
            id: None,
            subscriber: subscriber.into(),
            period,
            total: Decimal::ZERO,
            calls,
        };
        bill.recalculate_total();
        bill
    }

    /// Sum of all call prices
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Calls in End-record retrieval order
    pub fn calls(&self) -> &[PricedCall] {
        &self.calls
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Replace the call list and recompute the total
    pub fn replace_calls(&mut self, calls: Vec<PricedCall>) {
        self.calls = calls;
        self.recalculate_total();
    }

    fn recalculate_total(&mut self) {
        self.total = self.calls.iter().map(|call| call.price).sum();
    }
}
