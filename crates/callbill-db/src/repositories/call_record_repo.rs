//! Call record repository implementation
//!
//! PostgreSQL-backed storage for Start/End call records. Bill runs read
//! End records by month and Start records by call identifier.

use callbill_core::{
    models::{BillingPeriod, CallRecord, RecordKind},
    traits::{CallRecordRepository, Repository},
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

use super::is_unique_violation;

/// PostgreSQL implementation of CallRecordRepository
pub struct PgCallRecordRepository {
    pool: PgPool,
}

impl PgCallRecordRepository {
    /// Create a new call record repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Keep the id sequence ahead of client-supplied ids
    async fn sync_id_sequence(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            SELECT setval(
                pg_get_serial_sequence('phone_call', 'record_id'),
                GREATEST((SELECT MAX(record_id) FROM phone_call), 1)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error syncing call record sequence: {}", e);
            AppError::Database(format!("Failed to sync record id sequence: {}", e))
        })?;

        Ok(())
    }
}

const CALL_RECORD_SELECT_COLUMNS: &str = r#"
    record_id, record_type, record_timestamp, call_identifier,
    origin_number, destination_number
"#;

fn map_save_error(entity: &CallRecord, e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::AlreadyExists(format!(
            "A {} record for call {} already exists",
            entity.kind, entity.call_identifier
        ))
    } else {
        error!("Database error saving call record: {}", e);
        AppError::Database(format!("Failed to save call record: {}", e))
    }
}

#[async_trait]
impl Repository<CallRecord, i64> for PgCallRecordRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> AppResult<Option<CallRecord>> {
        debug!("Finding call record by id: {}", id);

        let query = format!(
            "SELECT {} FROM phone_call WHERE record_id = $1",
            CALL_RECORD_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding call record {}: {}", id, e);
                AppError::Database(format!("Failed to find call record: {}", e))
            })?;

        row.map(CallRecord::try_from).transpose()
    }

    #[instrument(skip(self, entity), fields(call_id = entity.call_identifier, kind = %entity.kind))]
    async fn save(&self, entity: &CallRecord) -> AppResult<CallRecord> {
        let row = match entity.id {
            Some(id) => {
                debug!("Saving call record with explicit id {}", id);

                // Origin and destination belong to Start records only
                let query = format!(
                    r#"
                    INSERT INTO phone_call (
                        record_id, record_type, record_timestamp, call_identifier,
                        origin_number, destination_number
                    )
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (record_id) DO UPDATE
                    SET record_type = EXCLUDED.record_type,
                        record_timestamp = EXCLUDED.record_timestamp,
                        call_identifier = EXCLUDED.call_identifier,
                        origin_number = CASE WHEN EXCLUDED.record_type = 'start'
                            THEN EXCLUDED.origin_number ELSE phone_call.origin_number END,
                        destination_number = CASE WHEN EXCLUDED.record_type = 'start'
                            THEN EXCLUDED.destination_number ELSE phone_call.destination_number END
                    RETURNING {}
                    "#,
                    CALL_RECORD_SELECT_COLUMNS
                );

                let row = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
                    .bind(id)
                    .bind(entity.kind.as_str())
                    .bind(entity.timestamp)
                    .bind(entity.call_identifier)
                    .bind(&entity.origin_number)
                    .bind(&entity.destination_number)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| map_save_error(entity, e))?;

                self.sync_id_sequence().await?;
                row
            }
            None => {
                debug!("Inserting call record");

                let query = format!(
                    r#"
                    INSERT INTO phone_call (
                        record_type, record_timestamp, call_identifier,
                        origin_number, destination_number
                    )
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING {}
                    "#,
                    CALL_RECORD_SELECT_COLUMNS
                );

                sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
                    .bind(entity.kind.as_str())
                    .bind(entity.timestamp)
                    .bind(entity.call_identifier)
                    .bind(&entity.origin_number)
                    .bind(&entity.destination_number)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| map_save_error(entity, e))?
            }
        };

        CallRecord::try_from(row)
    }
}

#[async_trait]
impl CallRecordRepository for PgCallRecordRepository {
    #[instrument(skip(self), fields(period = %period))]
    async fn find_end_records(&self, period: BillingPeriod) -> AppResult<Vec<CallRecord>> {
        let query = format!(
            r#"
            SELECT {}
            FROM phone_call
            WHERE record_type = 'end'
              AND record_timestamp >= $1
              AND record_timestamp < $2
            ORDER BY record_timestamp, record_id
            "#,
            CALL_RECORD_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(period.starts_at())
            .bind(period.ends_before())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error fetching end records: {}", e);
                AppError::Database(format!("Failed to fetch end records: {}", e))
            })?;

        debug!("Found {} end records", rows.len());
        rows.into_iter().map(CallRecord::try_from).collect()
    }

    #[instrument(skip(self, call_identifiers), fields(count = call_identifiers.len()))]
    async fn find_start_records(
        &self,
        subscriber: &str,
        call_identifiers: &[i64],
    ) -> AppResult<Vec<CallRecord>> {
        if call_identifiers.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            r#"
            SELECT {}
            FROM phone_call
            WHERE record_type = 'start'
              AND origin_number = $1
              AND call_identifier = ANY($2)
            "#,
            CALL_RECORD_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CallRecordRow>(&query)
            .bind(subscriber)
            .bind(call_identifiers)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error fetching start records: {}", e);
                AppError::Database(format!("Failed to fetch start records: {}", e))
            })?;

        rows.into_iter().map(CallRecord::try_from).collect()
    }
}

/// Database row representation
#[derive(Debug, sqlx::FromRow)]
struct CallRecordRow {
    record_id: i64,
    record_type: String,
    record_timestamp: NaiveDateTime,
    call_identifier: i64,
    origin_number: Option<String>,
    destination_number: Option<String>,
}

impl TryFrom<CallRecordRow> for CallRecord {
    type Error = AppError;

    fn try_from(row: CallRecordRow) -> Result<Self, Self::Error> {
        let kind: RecordKind = row.record_type.parse().map_err(|_| {
            AppError::Database(format!(
                "Unexpected record type '{}' for record {}",
                row.record_type, row.record_id
            ))
        })?;

        Ok(Self {
            id: Some(row.record_id),
            kind,
            timestamp: row.record_timestamp,
            call_identifier: row.call_identifier,
            origin_number: row.origin_number,
            destination_number: row.destination_number,
        })
    }
}
