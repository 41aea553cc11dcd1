//! Shared application state
//!
//! Handlers receive the repositories as trait objects, so the same routes
//! run on PostgreSQL or on the in-memory store.

use callbill_core::traits::{BillRepository, CallRecordRepository, PricedCallRepository};
use callbill_db::{MemoryStore, PgBillRepository, PgCallRecordRepository, PgPricedCallRepository, PgPool};
use callbill_services::{BillAggregator, TariffPricer};
use chrono::{Local, NaiveDate};
use std::sync::Arc;

/// Bill aggregator over trait-object repositories
pub type DynBillAggregator =
    BillAggregator<dyn CallRecordRepository, dyn PricedCallRepository, dyn BillRepository>;

#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn CallRecordRepository>,
    pub priced_calls: Arc<dyn PricedCallRepository>,
    pub bills: Arc<dyn BillRepository>,
    pub pricer: Arc<TariffPricer>,
    /// Fixed calendar date used instead of the local clock
    today: Option<NaiveDate>,
}

impl AppState {
    /// State backed by PostgreSQL repositories
    pub fn with_pool(pool: PgPool, pricer: TariffPricer) -> Self {
        Self {
            records: Arc::new(PgCallRecordRepository::new(pool.clone())),
            priced_calls: Arc::new(PgPricedCallRepository::new(pool.clone())),
            bills: Arc::new(PgBillRepository::new(pool)),
            pricer: Arc::new(pricer),
            today: None,
        }
    }

    /// State backed by a single in-memory store
    pub fn with_memory_store(store: Arc<MemoryStore>, pricer: TariffPricer) -> Self {
        Self {
            records: store.clone(),
            priced_calls: store.clone(),
            bills: store,
            pricer: Arc::new(pricer),
            today: None,
        }
    }

    /// Pin the date used to decide which periods are closed
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn aggregator(&self) -> DynBillAggregator {
        BillAggregator::new(
            Arc::clone(&self.records),
            Arc::clone(&self.priced_calls),
            Arc::clone(&self.bills),
            Arc::clone(&self.pricer),
        )
    }
}
