//! Common traits for repositories
//!
//! Storage abstractions shared by the Postgres and in-memory backends.

use crate::error::AppError;
use crate::models::{Bill, BillingPeriod, CallRecord, PricedCall};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Generic repository trait for keyed entities
#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, AppError>;

    /// Insert the entity, or update it when its ID already exists;
    /// returns the stored entity with its assigned ID
    async fn save(&self, entity: &T) -> Result<T, AppError>;
}

/// Call record repository
///
/// `(call_identifier, kind)` is unique: a second Start or End for the same
/// call is rejected with `AppError::AlreadyExists`.
#[async_trait]
pub trait CallRecordRepository: Repository<CallRecord, i64> {
    /// End records whose timestamp falls inside the period, ordered by
    /// timestamp then record ID
    async fn find_end_records(&self, period: BillingPeriod) -> Result<Vec<CallRecord>, AppError>;

    /// Start records originated by `subscriber` for the given call identifiers
    async fn find_start_records(
        &self,
        subscriber: &str,
        call_identifiers: &[i64],
    ) -> Result<Vec<CallRecord>, AppError>;
}

/// Priced call repository
#[async_trait]
pub trait PricedCallRepository: Send + Sync {
    /// Find the stored priced call for a call identifier
    async fn find_by_call_identifier(
        &self,
        call_identifier: i64,
    ) -> Result<Option<PricedCall>, AppError>;

    /// Store a priced call unless one exists for its call identifier
    ///
    /// Always returns the stored row, which may predate this call.
    async fn insert_if_absent(&self, call: &PricedCall) -> Result<PricedCall, AppError>;
}

/// Bill repository
#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Create or update the bill header for `(subscriber, period)`, returning its ID
    async fn upsert(
        &self,
        subscriber: &str,
        period: BillingPeriod,
        total: Decimal,
    ) -> Result<i64, AppError>;

    /// Load a stored bill with the calls first stored under it
    async fn find(&self, subscriber: &str, period: BillingPeriod)
        -> Result<Option<Bill>, AppError>;
}
