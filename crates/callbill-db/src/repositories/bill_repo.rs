//! Bill repository implementation
//!
//! One bill header per (phone number, period); the total is overwritten on
//! every bill run.

use callbill_core::{
    models::{Bill, BillingPeriod, PricedCall},
    traits::BillRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

use super::priced_call_repo::{PricedCallRow, PRICED_CALL_SELECT_COLUMNS};

/// PostgreSQL implementation of BillRepository
pub struct PgBillRepository {
    pool: PgPool,
}

impl PgBillRepository {
    /// Create a new bill repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillRepository for PgBillRepository {
    #[instrument(skip(self), fields(period = %period))]
    async fn upsert(
        &self,
        subscriber: &str,
        period: BillingPeriod,
        total: Decimal,
    ) -> AppResult<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO phone_bill (phone_number, period, total)
            VALUES ($1, $2, $3)
            ON CONFLICT (phone_number, period) DO UPDATE
            SET total = EXCLUDED.total,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(subscriber)
        .bind(period.to_string())
        .bind(total)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error storing bill: {}", e);
            AppError::Database(format!("Failed to store bill: {}", e))
        })?;

        debug!("Bill {} stored with total {}", id, total);
        Ok(id)
    }

    #[instrument(skip(self), fields(period = %period))]
    async fn find(&self, subscriber: &str, period: BillingPeriod) -> AppResult<Option<Bill>> {
        let header: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM phone_bill WHERE phone_number = $1 AND period = $2",
        )
        .bind(subscriber)
        .bind(period.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding bill: {}", e);
            AppError::Database(format!("Failed to find bill: {}", e))
        })?;

        let Some((id,)) = header else {
            return Ok(None);
        };

        let query = format!(
            r#"
            SELECT {}
            FROM phone_bill_call
            WHERE bill_id = $1
            ORDER BY call_end, call_identifier
            "#,
            PRICED_CALL_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, PricedCallRow>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error loading calls of bill {}: {}", id, e);
                AppError::Database(format!("Failed to load bill calls: {}", e))
            })?;

        let calls: Vec<PricedCall> = rows.into_iter().map(Into::into).collect();
        let mut bill = Bill::new(subscriber, period, calls);
        bill.id = Some(id);

        Ok(Some(bill))
    }
}
