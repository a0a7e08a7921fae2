//! PostgreSQL history backend

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{HistoryRecord, HistoryStore};
use crate::error::{AppError, Result};

/// Row of `quote_history`
#[derive(Debug, Clone, FromRow)]
struct QuoteHistoryRow {
    issued_at: NaiveDateTime,
    reference: String,
    client: String,
    contact: String,
    circuit: String,
    headcount: i32,
    day_count: i32,
    total: Decimal,
    options_summary: String,
}

impl From<QuoteHistoryRow> for HistoryRecord {
    fn from(row: QuoteHistoryRow) -> Self {
        HistoryRecord {
            timestamp: row.issued_at,
            reference: row.reference,
            client: row.client,
            contact: row.contact,
            circuit: row.circuit,
            headcount: row.headcount.max(1) as u32,
            day_count: row.day_count.max(1) as u32,
            total: row.total,
            options_summary: row.options_summary,
        }
    }
}

/// History in the `quote_history` table.
///
/// The unique constraint on `reference` turns a cross-process numbering
/// race into [`AppError::Conflict`] instead of a duplicate row.
#[derive(Debug, Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quote_history (
                id UUID PRIMARY KEY,
                issued_at TIMESTAMP NOT NULL,
                reference TEXT NOT NULL UNIQUE,
                client TEXT NOT NULL,
                contact TEXT NOT NULL DEFAULT '',
                circuit TEXT NOT NULL DEFAULT '',
                headcount INTEGER NOT NULL,
                day_count INTEGER NOT NULL,
                total NUMERIC(14, 2) NOT NULL,
                options_summary TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Count as stored in an `INTEGER` column
fn column_int(column: &str, value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| AppError::History(format!("{} {} does not fit the {} column", column, value, column)))
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM quote_history
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as usize)
    }

    async fn append(&self, record: &HistoryRecord) -> Result<()> {
        let headcount = column_int("headcount", record.headcount)?;
        let day_count = column_int("day_count", record.day_count)?;

        let result = sqlx::query(
            r#"
            INSERT INTO quote_history (
                id, issued_at, reference, client, contact, circuit,
                headcount, day_count, total, options_summary
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.timestamp)
        .bind(&record.reference)
        .bind(&record.client)
        .bind(&record.contact)
        .bind(&record.circuit)
        .bind(headcount)
        .bind(day_count)
        .bind(record.total)
        .bind(&record.options_summary)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict(record.reference.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>> {
        let rows = sqlx::query_as::<_, QuoteHistoryRow>(
            r#"
            SELECT
                issued_at, reference, client, contact, circuit,
                headcount, day_count, total, options_summary
            FROM quote_history
            ORDER BY issued_at, reference
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(HistoryRecord::from).collect())
    }
}
