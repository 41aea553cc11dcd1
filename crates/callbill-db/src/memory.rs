//! In-memory store
//!
//! Implements every repository trait over lock-protected maps, with the
//! same uniqueness rules as the PostgreSQL schema. Used by tests and when
//! no database URL is configured.

use async_trait::async_trait;
use callbill_core::{
    models::{Bill, BillingPeriod, CallRecord, PricedCall, RecordKind},
    traits::{BillRepository, CallRecordRepository, PricedCallRepository, Repository},
    AppError, AppResult,
};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

#[derive(Debug)]
struct StoredBill {
    id: i64,
    total: Decimal,
}

#[derive(Debug, Default)]
struct Tables {
    records: BTreeMap<i64, CallRecord>,
    last_record_id: i64,
    priced_calls: HashMap<i64, PricedCall>,
    last_priced_call_id: i64,
    bills: HashMap<(String, BillingPeriod), StoredBill>,
    last_bill_id: i64,
}

impl Tables {
    fn has_duplicate(&self, entity: &CallRecord) -> bool {
        self.records.values().any(|r| {
            r.call_identifier == entity.call_identifier
                && r.kind == entity.kind
                && r.id != entity.id
        })
    }
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn record_count(&self) -> usize {
        self.tables.read().records.len()
    }

    /// Stored total of a bill header
    pub fn bill_total(&self, subscriber: &str, period: BillingPeriod) -> Option<Decimal> {
        self.tables
            .read()
            .bills
            .get(&(subscriber.to_string(), period))
            .map(|bill| bill.total)
    }
}

#[async_trait]
impl Repository<CallRecord, i64> for MemoryStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<CallRecord>> {
        Ok(self.tables.read().records.get(&id).cloned())
    }

    #[instrument(skip(self, entity), fields(call_id = entity.call_identifier, kind = %entity.kind))]
    async fn save(&self, entity: &CallRecord) -> AppResult<CallRecord> {
        let mut tables = self.tables.write();

        if tables.has_duplicate(entity) {
            return Err(AppError::AlreadyExists(format!(
                "A {} record for call {} already exists",
                entity.kind, entity.call_identifier
            )));
        }

        let id = match entity.id {
            Some(id) => {
                tables.last_record_id = tables.last_record_id.max(id);
                id
            }
            None => {
                tables.last_record_id += 1;
                tables.last_record_id
            }
        };

        let mut stored = entity.clone();
        stored.id = Some(id);

        // Origin and destination belong to Start records only
        if stored.kind == RecordKind::End {
            if let Some(existing) = tables.records.get(&id) {
                stored.origin_number = existing.origin_number.clone();
                stored.destination_number = existing.destination_number.clone();
            }
        }

        debug!("Stored call record {}", id);
        tables.records.insert(id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl CallRecordRepository for MemoryStore {
    async fn find_end_records(&self, period: BillingPeriod) -> AppResult<Vec<CallRecord>> {
        let tables = self.tables.read();
        let mut records: Vec<CallRecord> = tables
            .records
            .values()
            .filter(|r| r.is_end() && period.contains(r.timestamp))
            .cloned()
            .collect();

        records.sort_by_key(|r| (r.timestamp, r.id));
        Ok(records)
    }

    async fn find_start_records(
        &self,
        subscriber: &str,
        call_identifiers: &[i64],
    ) -> AppResult<Vec<CallRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .records
            .values()
            .filter(|r| {
                r.is_start()
                    && r.origin_number.as_deref() == Some(subscriber)
                    && call_identifiers.contains(&r.call_identifier)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PricedCallRepository for MemoryStore {
    async fn find_by_call_identifier(&self, call_identifier: i64) -> AppResult<Option<PricedCall>> {
        Ok(self.tables.read().priced_calls.get(&call_identifier).cloned())
    }

    async fn insert_if_absent(&self, call: &PricedCall) -> AppResult<PricedCall> {
        let mut tables = self.tables.write();

        if let Some(existing) = tables.priced_calls.get(&call.call_identifier) {
            debug!(call_id = call.call_identifier, "Priced call already stored");
            return Ok(existing.clone());
        }

        tables.last_priced_call_id += 1;
        let mut stored = call.clone();
        stored.id = Some(tables.last_priced_call_id);
        tables
            .priced_calls
            .insert(call.call_identifier, stored.clone());

        Ok(stored)
    }
}

#[async_trait]
impl BillRepository for MemoryStore {
    async fn upsert(
        &self,
        subscriber: &str,
        period: BillingPeriod,
        total: Decimal,
    ) -> AppResult<i64> {
        let mut tables = self.tables.write();
        let key = (subscriber.to_string(), period);

        if let Some(bill) = tables.bills.get_mut(&key) {
            bill.total = total;
            return Ok(bill.id);
        }

        tables.last_bill_id += 1;
        let id = tables.last_bill_id;
        tables.bills.insert(key, StoredBill { id, total });
        Ok(id)
    }

    async fn find(&self, subscriber: &str, period: BillingPeriod) -> AppResult<Option<Bill>> {
        let tables = self.tables.read();
        let Some(stored) = tables.bills.get(&(subscriber.to_string(), period)) else {
            return Ok(None);
        };

        let mut calls: Vec<PricedCall> = tables
            .priced_calls
            .values()
            .filter(|call| call.bill_id == Some(stored.id))
            .cloned()
            .collect();
        calls.sort_by_key(|call| (call.call_end, call.call_identifier));

        let mut bill = Bill::new(subscriber, period, calls);
        bill.id = Some(stored.id);
        Ok(Some(bill))
    }
}
