//! Bill aggregation
//!
//! Matches the End records of a month with the subscriber's Start records,
//! prices each pair once, and stores the bill.

use callbill_core::{
    models::{Bill, BillingPeriod, CallRecord, PricedCall},
    traits::{BillRepository, CallRecordRepository, PricedCallRepository},
    AppResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::pricing::TariffPricer;

/// Builds and stores subscriber bills
///
/// Repositories are held behind `Arc` so the aggregator can run on trait
/// objects as well as concrete stores.
pub struct BillAggregator<C: ?Sized, P: ?Sized, B: ?Sized> {
    records: Arc<C>,
    priced_calls: Arc<P>,
    bills: Arc<B>,
    pricer: Arc<TariffPricer>,
}

impl<C, P, B> BillAggregator<C, P, B>
where
    C: CallRecordRepository + ?Sized,
    P: PricedCallRepository + ?Sized,
    B: BillRepository + ?Sized,
{
    pub fn new(
        records: Arc<C>,
        priced_calls: Arc<P>,
        bills: Arc<B>,
        pricer: Arc<TariffPricer>,
    ) -> Self {
        Self {
            records,
            priced_calls,
            bills,
            pricer,
        }
    }

    /// Build the bill of `subscriber` for `period` without storing it
    ///
    /// End records without a matching Start of this subscriber are skipped,
    /// as are pairs that cannot be priced (an End before its Start, a Start
    /// without destination). Calls already priced by an earlier run are
    /// reused unchanged.
    #[instrument(skip(self), fields(period = %period))]
    pub async fn build(&self, subscriber: &str, period: BillingPeriod) -> AppResult<Bill> {
        let ends = self.records.find_end_records(period).await?;
        let call_identifiers: Vec<i64> = ends.iter().map(|end| end.call_identifier).collect();

        let starts: HashMap<i64, CallRecord> = self
            .records
            .find_start_records(subscriber, &call_identifiers)
            .await?
            .into_iter()
            .map(|start| (start.call_identifier, start))
            .collect();

        let mut calls = Vec::with_capacity(starts.len());

        for end in &ends {
            let Some(start) = starts.get(&end.call_identifier) else {
                debug!(call_id = end.call_identifier, "No start record, skipping");
                continue;
            };

            if let Some(stored) = self
                .priced_calls
                .find_by_call_identifier(end.call_identifier)
                .await?
            {
                debug!(call_id = end.call_identifier, "Reusing stored priced call");
                calls.push(stored);
                continue;
            }

            // A rejected pair affects only its own call
            match self.pricer.price_call(start, end) {
                Ok(call) => calls.push(call),
                Err(reason) => {
                    warn!(call_id = end.call_identifier, %reason, "Unbillable call, skipping");
                }
            }
        }

        let bill = Bill::new(subscriber, period, calls);
        info!(
            calls = bill.calls().len(),
            total = %bill.total(),
            "Bill built"
        );

        Ok(bill)
    }

    /// Store the bill header and its calls
    ///
    /// Each call is stored at most once per call identifier; the bill then
    /// holds the stored rows and its total is recomputed from them.
    #[instrument(skip(self, bill), fields(period = %bill.period))]
    pub async fn persist(&self, bill: &mut Bill) -> AppResult<()> {
        let bill_id = self
            .bills
            .upsert(&bill.subscriber, bill.period, bill.total())
            .await?;
        bill.id = Some(bill_id);

        let mut stored: Vec<PricedCall> = Vec::with_capacity(bill.calls().len());
        for call in bill.calls() {
            let mut call = call.clone();
            if call.bill_id.is_none() {
                call.bill_id = Some(bill_id);
            }
            stored.push(self.priced_calls.insert_if_absent(&call).await?);
        }

        let written_total = bill.total();
        bill.replace_calls(stored);

        // A concurrent run may have stored different rows first
        if bill.total() != written_total {
            warn!(
                expected = %written_total,
                stored = %bill.total(),
                "Stored calls differ from computed calls, updating total"
            );
            self.bills
                .upsert(&bill.subscriber, bill.period, bill.total())
                .await?;
        }

        info!(bill_id, total = %bill.total(), "Bill stored");
        Ok(())
    }

    /// Build and store the bill in one step
    pub async fn run(&self, subscriber: &str, period: BillingPeriod) -> AppResult<Bill> {
        let mut bill = self.build(subscriber, period).await?;
        self.persist(&mut bill).await?;
        Ok(bill)
    }
}

impl<C: ?Sized, P: ?Sized, B: ?Sized> Clone for BillAggregator<C, P, B> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            priced_calls: Arc::clone(&self.priced_calls),
            bills: Arc::clone(&self.bills),
            pricer: Arc::clone(&self.pricer),
        }
    }
}
