//! Priced call repository implementation
//!
//! A priced call is stored at most once per call identifier. Concurrent
//! bill runs converge on the first stored row.

use callbill_core::{models::PricedCall, traits::PricedCallRepository, AppError, AppResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of PricedCallRepository
pub struct PgPricedCallRepository {
    pool: PgPool,
}

impl PgPricedCallRepository {
    /// Create a new priced call repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) const PRICED_CALL_SELECT_COLUMNS: &str = r#"
    id, bill_id, call_identifier, destination_number,
    call_start, call_end, duration_seconds, price
"#;

#[async_trait]
impl PricedCallRepository for PgPricedCallRepository {
    #[instrument(skip(self))]
    async fn find_by_call_identifier(&self, call_identifier: i64) -> AppResult<Option<PricedCall>> {
        let query = format!(
            "SELECT {} FROM phone_bill_call WHERE call_identifier = $1",
            PRICED_CALL_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, PricedCallRow>(&query)
            .bind(call_identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding priced call {}: {}", call_identifier, e);
                AppError::Database(format!("Failed to find priced call: {}", e))
            })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, call), fields(call_id = call.call_identifier))]
    async fn insert_if_absent(&self, call: &PricedCall) -> AppResult<PricedCall> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO phone_bill_call (
                bill_id, call_identifier, destination_number,
                call_start, call_end, duration_seconds, price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (call_identifier) DO NOTHING
            "#,
        )
        .bind(call.bill_id)
        .bind(call.call_identifier)
        .bind(&call.destination_number)
        .bind(call.call_start)
        .bind(call.call_end)
        .bind(call.duration_seconds)
        .bind(call.price)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error storing priced call: {}", e);
            AppError::Database(format!("Failed to store priced call: {}", e))
        })?
        .rows_affected();

        if inserted == 0 {
            debug!("Priced call already stored, keeping existing row");
        }

        self.find_by_call_identifier(call.call_identifier)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Priced call {} missing after insert",
                    call.call_identifier
                ))
            })
    }
}

/// Database row representation
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PricedCallRow {
    id: i64,
    bill_id: Option<i64>,
    call_identifier: i64,
    destination_number: String,
    call_start: NaiveDateTime,
    call_end: NaiveDateTime,
    duration_seconds: i64,
    price: Decimal,
}

impl From<PricedCallRow> for PricedCall {
    fn from(row: PricedCallRow) -> Self {
        Self {
            id: Some(row.id),
            bill_id: row.bill_id,
            destination_number: row.destination_number,
            call_identifier: row.call_identifier,
            call_start: row.call_start,
            call_end: row.call_end,
            duration_seconds: row.duration_seconds,
            price: row.price,
        }
    }
}
