//! Fixed asset service with straight-line monthly depreciation

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::account::{account_id_by_code_tx, codes};
use crate::services::journal::post_lines_tx;
use shared::models::{Asset, JournalLineInput};

/// Fixed asset service
#[derive(Clone)]
pub struct AssetService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    name: String,
    acquisition_cost: Decimal,
    acquisition_date: NaiveDate,
    useful_life_months: i32,
    salvage_value: Decimal,
    accumulated_depreciation: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
}

const ASSET_COLUMNS: &str = "id, name, acquisition_cost, acquisition_date, useful_life_months, \
     salvage_value, accumulated_depreciation, is_active, created_at";

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Asset {
            id: row.id,
            name: row.name,
            acquisition_cost: row.acquisition_cost,
            acquisition_date: row.acquisition_date,
            useful_life_months: row.useful_life_months,
            salvage_value: row.salvage_value,
            accumulated_depreciation: row.accumulated_depreciation,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// Input for registering an asset
#[derive(Debug, Deserialize)]
pub struct CreateAssetInput {
    pub name: String,
    pub acquisition_cost: Decimal,
    pub acquisition_date: NaiveDate,
    pub useful_life_months: i32,
    #[serde(default)]
    pub salvage_value: Decimal,
}

/// Result of a monthly depreciation run
#[derive(Debug, Serialize)]
pub struct DepreciationRun {
    pub year: i32,
    pub month: u32,
    pub charged: Vec<DepreciationCharge>,
    pub total: Decimal,
}

/// One asset's charge within a depreciation run
#[derive(Debug, Serialize)]
pub struct DepreciationCharge {
    pub asset_id: Uuid,
    pub asset_name: String,
    pub amount: Decimal,
}

impl AssetService {
    /// Create a new AssetService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a fixed asset
    pub async fn create_asset(&self, input: CreateAssetInput) -> AppResult<Asset> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Asset name is required".to_string(),
                message_id: "Nama aset wajib diisi".to_string(),
            });
        }
        if input.acquisition_cost <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "acquisition_cost".to_string(),
                message: "Acquisition cost must be positive".to_string(),
                message_id: "Harga perolehan harus lebih dari nol".to_string(),
            });
        }
        if input.useful_life_months <= 0 {
            return Err(AppError::Validation {
                field: "useful_life_months".to_string(),
                message: "Useful life must be at least one month".to_string(),
                message_id: "Masa manfaat minimal satu bulan".to_string(),
            });
        }
        if input.salvage_value < Decimal::ZERO || input.salvage_value >= input.acquisition_cost {
            return Err(AppError::Validation {
                field: "salvage_value".to_string(),
                message: "Salvage value must be below the acquisition cost".to_string(),
                message_id: "Nilai sisa harus di bawah harga perolehan".to_string(),
            });
        }

        let row = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            INSERT INTO assets
                (name, acquisition_cost, acquisition_date, useful_life_months, salvage_value)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ASSET_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.acquisition_cost)
        .bind(input.acquisition_date)
        .bind(input.useful_life_months)
        .bind(input.salvage_value)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get one asset
    pub async fn get_asset(&self, asset_id: Uuid) -> AppResult<Asset> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1"
        ))
        .bind(asset_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Asset".to_string()))?;

        Ok(row.into())
    }

    /// List assets
    pub async fn list_assets(&self) -> AppResult<Vec<Asset>> {
        let rows = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets ORDER BY acquisition_date, name"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Asset::from).collect())
    }

    /// Retire an asset; no further depreciation is charged
    pub async fn retire_asset(&self, asset_id: Uuid) -> AppResult<Asset> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            "UPDATE assets SET is_active = false WHERE id = $1 RETURNING {ASSET_COLUMNS}"
        ))
        .bind(asset_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Asset".to_string()))?;

        Ok(row.into())
    }

    /// Run depreciation for one month
    ///
    /// Charges every active asset at most once per month: assets already
    /// charged for the month are skipped, as are assets acquired after it
    /// and assets fully depreciated down to salvage value. Posts a single
    /// balanced entry dated at the end of the month.
    pub async fn run_depreciation(&self, year: i32, month: u32) -> AppResult<DepreciationRun> {
        let period_end = month_end(year, month).ok_or_else(|| AppError::Validation {
            field: "month".to_string(),
            message: "Month must be between 1 and 12".to_string(),
            message_id: "Bulan harus antara 1 dan 12".to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        let rows = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            SELECT {ASSET_COLUMNS} FROM assets
            WHERE is_active = true
              AND acquisition_date <= $1
              AND NOT EXISTS (
                  SELECT 1 FROM depreciation_charges dc
                  WHERE dc.asset_id = assets.id AND dc.year = $2 AND dc.month = $3
              )
            ORDER BY acquisition_date, name
            FOR UPDATE OF assets
            "#
        ))
        .bind(period_end)
        .bind(year)
        .bind(month as i32)
        .fetch_all(&mut *tx)
        .await?;

        let mut charged = Vec::new();
        let mut total = Decimal::ZERO;
        for row in rows {
            let asset: Asset = row.into();
            let amount = asset.monthly_depreciation();
            if amount <= Decimal::ZERO {
                continue;
            }
            charged.push(DepreciationCharge {
                asset_id: asset.id,
                asset_name: asset.name,
                amount,
            });
            total += amount;
        }

        if charged.is_empty() {
            tx.commit().await?;
            return Ok(DepreciationRun {
                year,
                month,
                charged,
                total,
            });
        }

        let expense = account_id_by_code_tx(&mut tx, codes::DEPRECIATION_EXPENSE).await?;
        let accumulated = account_id_by_code_tx(&mut tx, codes::ACCUMULATED_DEPRECIATION).await?;

        let mut lines = Vec::with_capacity(charged.len() + 1);
        for charge in &charged {
            lines.push(JournalLineInput {
                account_id: expense,
                debit: charge.amount,
                credit: Decimal::ZERO,
                memo: Some(format!("Depreciation: {}", charge.asset_name)),
            });
        }
        lines.push(JournalLineInput {
            account_id: accumulated,
            debit: Decimal::ZERO,
            credit: total,
            memo: Some(format!("Depreciation {:04}-{:02}", year, month)),
        });

        let entry_id = post_lines_tx(
            &mut tx,
            period_end,
            &format!("Monthly depreciation {:04}-{:02}", year, month),
            None,
            &lines,
            None,
        )
        .await?;

        for charge in &charged {
            sqlx::query(
                r#"
                INSERT INTO depreciation_charges (asset_id, year, month, amount, journal_entry_id)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(charge.asset_id)
            .bind(year)
            .bind(month as i32)
            .bind(charge.amount)
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE assets SET accumulated_depreciation = accumulated_depreciation + $1 WHERE id = $2",
            )
            .bind(charge.amount)
            .bind(charge.asset_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(DepreciationRun {
            year,
            month,
            charged,
            total,
        })
    }
}

/// Last day of the given month, None for an out-of-range month
fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next.pred_opt().or(Some(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_end_handles_february_and_december() {
        assert_eq!(
            month_end(2026, 2),
            NaiveDate::from_ymd_opt(2026, 2, 28)
        );
        assert_eq!(
            month_end(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            month_end(2026, 12),
            NaiveDate::from_ymd_opt(2026, 12, 31)
        );
        assert_eq!(month_end(2026, 13), None);
    }
}
