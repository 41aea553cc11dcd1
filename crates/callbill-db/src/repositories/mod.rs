//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in
//! callbill-core. All queries are runtime queries with bound parameters.

pub mod bill_repo;
pub mod call_record_repo;
pub mod priced_call_repo;

pub use bill_repo::PgBillRepository;
pub use call_record_repo::PgCallRecordRepository;
pub use priced_call_repo::PgPricedCallRepository;

/// Whether a sqlx error is a unique constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
