//! Financial period service
//!
//! Periods are monthly. Posting into a closed period is rejected; closing a
//! period requires that no draft entries remain dated inside it.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::FinancialPeriod;

/// Period service
#[derive(Clone)]
pub struct PeriodService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct PeriodRow {
    id: Uuid,
    year: i32,
    month: i32,
    is_closed: bool,
    closed_at: Option<DateTime<Utc>>,
}

impl From<PeriodRow> for FinancialPeriod {
    fn from(row: PeriodRow) -> Self {
        FinancialPeriod {
            id: row.id,
            year: row.year,
            month: row.month as u32,
            is_closed: row.is_closed,
            closed_at: row.closed_at,
        }
    }
}

/// Input identifying a period
#[derive(Debug, Deserialize)]
pub struct PeriodInput {
    pub year: i32,
    pub month: u32,
}

impl PeriodService {
    /// Create a new PeriodService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List known periods, newest first
    pub async fn list_periods(&self) -> AppResult<Vec<FinancialPeriod>> {
        let rows = sqlx::query_as::<_, PeriodRow>(
            r#"
            SELECT id, year, month, is_closed, closed_at
            FROM financial_periods
            ORDER BY year DESC, month DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Close a period; fails while draft entries remain dated inside it
    pub async fn close_period(&self, input: PeriodInput) -> AppResult<FinancialPeriod> {
        validate_month(input.month)?;

        let drafts = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM journal_entries
            WHERE status = 'draft'
              AND date_part('year', entry_date) = $1
              AND date_part('month', entry_date) = $2
            "#,
        )
        .bind(input.year)
        .bind(input.month as i32)
        .fetch_one(&self.db)
        .await?;

        if drafts > 0 {
            return Err(AppError::Conflict {
                resource: "period".to_string(),
                message: format!(
                    "{} draft journal entries remain in {}-{:02}",
                    drafts, input.year, input.month
                ),
                message_id: format!(
                    "Masih ada {} jurnal draft pada periode {}-{:02}",
                    drafts, input.year, input.month
                ),
            });
        }

        let row = sqlx::query_as::<_, PeriodRow>(
            r#"
            INSERT INTO financial_periods (year, month, is_closed, closed_at)
            VALUES ($1, $2, TRUE, NOW())
            ON CONFLICT (year, month)
            DO UPDATE SET is_closed = TRUE, closed_at = NOW()
            RETURNING id, year, month, is_closed, closed_at
            "#,
        )
        .bind(input.year)
        .bind(input.month as i32)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Reopen a closed period
    pub async fn reopen_period(&self, input: PeriodInput) -> AppResult<FinancialPeriod> {
        validate_month(input.month)?;

        let row = sqlx::query_as::<_, PeriodRow>(
            r#"
            UPDATE financial_periods
            SET is_closed = FALSE, closed_at = NULL
            WHERE year = $1 AND month = $2
            RETURNING id, year, month, is_closed, closed_at
            "#,
        )
        .bind(input.year)
        .bind(input.month as i32)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Financial period".to_string()))?;

        Ok(row.into())
    }
}

fn validate_month(month: u32) -> AppResult<()> {
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation {
            field: "month".to_string(),
            message: "Month must be between 1 and 12".to_string(),
            message_id: "Bulan harus antara 1 dan 12".to_string(),
        });
    }
    Ok(())
}

/// Ensure the period containing `date` is open, creating it on first use
///
/// Called from every posting path, inside the posting transaction.
pub async fn ensure_period_open_tx(
    tx: &mut Transaction<'_, Postgres>,
    date: NaiveDate,
) -> AppResult<()> {
    let year = date.year();
    let month = date.month() as i32;

    sqlx::query(
        r#"
        INSERT INTO financial_periods (year, month)
        VALUES ($1, $2)
        ON CONFLICT (year, month) DO NOTHING
        "#,
    )
    .bind(year)
    .bind(month)
    .execute(&mut **tx)
    .await?;

    let is_closed = sqlx::query_scalar::<_, bool>(
        "SELECT is_closed FROM financial_periods WHERE year = $1 AND month = $2",
    )
    .bind(year)
    .bind(month)
    .fetch_one(&mut **tx)
    .await?;

    if is_closed {
        return Err(AppError::PeriodClosed(format!("{}-{:02}", year, month)));
    }
    Ok(())
}
