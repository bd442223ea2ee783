//! Chart of accounts service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{AccountType, ChartOfAccount};
use shared::validation::validate_account_code;

/// Well-known account codes used by automatic postings
pub mod codes {
    pub const CASH: &str = "1000";
    pub const BANK: &str = "1010";
    pub const ACCOUNTS_RECEIVABLE: &str = "1100";
    pub const ACCUMULATED_DEPRECIATION: &str = "1510";
    pub const ACCOUNTS_PAYABLE: &str = "2000";
    pub const CUSTOMER_DEPOSITS: &str = "2100";
    pub const SALES_REVENUE: &str = "4000";
    pub const DEPRECIATION_EXPENSE: &str = "6100";
}

/// Account service for the chart of accounts
#[derive(Clone)]
pub struct AccountService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    code: String,
    name: String,
    account_type: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for ChartOfAccount {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let account_type = AccountType::from_str(&row.account_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown account type: {}", row.account_type))
        })?;
        Ok(ChartOfAccount {
            id: row.id,
            code: row.code,
            name: row.name,
            account_type,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Input for creating an account
#[derive(Debug, Deserialize)]
pub struct CreateAccountInput {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
}

/// Input for updating an account
#[derive(Debug, Deserialize)]
pub struct UpdateAccountInput {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl AccountService {
    /// Create a new AccountService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an account in the chart of accounts
    pub async fn create_account(&self, input: CreateAccountInput) -> AppResult<ChartOfAccount> {
        if let Err(msg) = validate_account_code(&input.code) {
            return Err(AppError::Validation {
                field: "code".to_string(),
                message: msg.to_string(),
                message_id: "Kode akun harus berupa 3-10 digit angka".to_string(),
            });
        }
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Account name is required".to_string(),
                message_id: "Nama akun wajib diisi".to_string(),
            });
        }

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chart_of_accounts WHERE code = $1")
                .bind(&input.code)
                .fetch_one(&self.db)
                .await?;
        if existing > 0 {
            return Err(AppError::DuplicateEntry("account code".to_string()));
        }

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO chart_of_accounts (code, name, account_type)
            VALUES ($1, $2, $3)
            RETURNING id, code, name, account_type, is_active, created_at, updated_at
            "#,
        )
        .bind(&input.code)
        .bind(input.name.trim())
        .bind(input.account_type.as_str())
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: Uuid) -> AppResult<ChartOfAccount> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, code, name, account_type, is_active, created_at, updated_at
            FROM chart_of_accounts
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        row.try_into()
    }

    /// List accounts, ordered by code
    pub async fn list_accounts(&self, include_inactive: bool) -> AppResult<Vec<ChartOfAccount>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, code, name, account_type, is_active, created_at, updated_at
            FROM chart_of_accounts
            WHERE is_active OR $1
            ORDER BY code
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Update account name or active flag
    pub async fn update_account(
        &self,
        account_id: Uuid,
        input: UpdateAccountInput,
    ) -> AppResult<ChartOfAccount> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE chart_of_accounts
            SET name = COALESCE($1, name),
                is_active = COALESCE($2, is_active)
            WHERE id = $3
            RETURNING id, code, name, account_type, is_active, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(input.is_active)
        .bind(account_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        row.try_into()
    }

    /// Delete an account that has never been journaled; otherwise deactivate
    pub async fn delete_account(&self, account_id: Uuid) -> AppResult<()> {
        let used = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM journal_entry_items WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_one(&self.db)
        .await?;

        if used > 0 {
            return Err(AppError::Conflict {
                resource: "account".to_string(),
                message: "Account has journal items and cannot be deleted, deactivate it instead"
                    .to_string(),
                message_id: "Akun memiliki jurnal dan tidak bisa dihapus, nonaktifkan saja"
                    .to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM chart_of_accounts WHERE id = $1")
            .bind(account_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account".to_string()));
        }
        Ok(())
    }
}

/// Resolve a well-known account by code inside a transaction
pub async fn account_id_by_code_tx(
    tx: &mut Transaction<'_, Postgres>,
    code: &str,
) -> AppResult<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM chart_of_accounts WHERE code = $1 AND is_active",
    )
    .bind(code)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::Configuration(format!("Missing account with code {}", code)))
}
