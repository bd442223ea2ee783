//! Ledger reporting service: trial balance and general ledger

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{AccountType, TrialBalance, TrialBalanceLine};
use shared::validation::balance_tolerance;

/// Ledger service
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct TrialBalanceRow {
    account_id: Uuid,
    account_code: String,
    account_name: String,
    account_type: String,
    debit_total: Decimal,
    credit_total: Decimal,
}

/// One posted line in an account's ledger, with running balance
#[derive(Debug, Serialize)]
pub struct LedgerLine {
    pub entry_id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Running balance on the account's normal side
    pub running_balance: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    entry_id: Uuid,
    entry_number: String,
    entry_date: NaiveDate,
    description: String,
    debit: Decimal,
    credit: Decimal,
}

/// General ledger for one account
#[derive(Debug, Serialize)]
pub struct GeneralLedger {
    pub account_id: Uuid,
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub lines: Vec<LedgerLine>,
    pub closing_balance: Decimal,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Trial balance over posted entries dated on or before `as_of`
    ///
    /// The grand totals are asserted against the balance tolerance; a
    /// violation means posted data is corrupt and surfaces as an internal
    /// error rather than a report.
    pub async fn trial_balance(&self, as_of: NaiveDate) -> AppResult<TrialBalance> {
        let rows = sqlx::query_as::<_, TrialBalanceRow>(
            r#"
            SELECT a.id AS account_id, a.code AS account_code, a.name AS account_name,
                   a.account_type,
                   COALESCE(SUM(i.debit), 0) AS debit_total,
                   COALESCE(SUM(i.credit), 0) AS credit_total
            FROM chart_of_accounts a
            JOIN journal_entry_items i ON i.account_id = a.id
            JOIN journal_entries e ON e.id = i.entry_id
            WHERE e.status = 'posted' AND e.entry_date <= $1
            GROUP BY a.id, a.code, a.name, a.account_type
            ORDER BY a.code
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.db)
        .await?;

        let mut lines = Vec::with_capacity(rows.len());
        let mut debit_total = Decimal::ZERO;
        let mut credit_total = Decimal::ZERO;
        for row in rows {
            let account_type = AccountType::from_str(&row.account_type).ok_or_else(|| {
                AppError::Internal(format!("Unknown account type: {}", row.account_type))
            })?;
            debit_total += row.debit_total;
            credit_total += row.credit_total;
            lines.push(TrialBalanceLine {
                account_id: row.account_id,
                account_code: row.account_code,
                account_name: row.account_name,
                account_type,
                debit_total: row.debit_total,
                credit_total: row.credit_total,
            });
        }

        if (debit_total - credit_total).abs() > balance_tolerance() {
            return Err(AppError::Internal(format!(
                "Trial balance out of balance: debit {} credit {}",
                debit_total, credit_total
            )));
        }

        Ok(TrialBalance {
            as_of,
            lines,
            debit_total,
            credit_total,
        })
    }

    /// General ledger for one account between two dates
    pub async fn general_ledger(
        &self,
        account_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<GeneralLedger> {
        let account = sqlx::query_as::<_, (String, String, String)>(
            "SELECT code, name, account_type FROM chart_of_accounts WHERE id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        let account_type = AccountType::from_str(&account.2)
            .ok_or_else(|| AppError::Internal(format!("Unknown account type: {}", account.2)))?;

        // Opening balance from everything posted before the window
        let opening = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(i.debit), 0), COALESCE(SUM(i.credit), 0)
            FROM journal_entry_items i
            JOIN journal_entries e ON e.id = i.entry_id
            WHERE i.account_id = $1 AND e.status = 'posted' AND e.entry_date < $2
            "#,
        )
        .bind(account_id)
        .bind(from)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT e.id AS entry_id, e.entry_number, e.entry_date, e.description,
                   i.debit, i.credit
            FROM journal_entry_items i
            JOIN journal_entries e ON e.id = i.entry_id
            WHERE i.account_id = $1 AND e.status = 'posted'
              AND e.entry_date >= $2 AND e.entry_date <= $3
            ORDER BY e.entry_date, e.entry_number
            "#,
        )
        .bind(account_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        let mut running = signed_balance(account_type, opening.0, opening.1);
        let lines = rows
            .into_iter()
            .map(|row| {
                running += signed_balance(account_type, row.debit, row.credit);
                LedgerLine {
                    entry_id: row.entry_id,
                    entry_number: row.entry_number,
                    entry_date: row.entry_date,
                    description: row.description,
                    debit: row.debit,
                    credit: row.credit,
                    running_balance: running,
                }
            })
            .collect();

        Ok(GeneralLedger {
            account_id,
            account_code: account.0,
            account_name: account.1,
            account_type,
            lines,
            closing_balance: running,
        })
    }
}

/// Debit/credit movement expressed on the account's normal side
fn signed_balance(account_type: AccountType, debit: Decimal, credit: Decimal) -> Decimal {
    match account_type.normal_balance() {
        shared::models::BalanceSide::Debit => debit - credit,
        shared::models::BalanceSide::Credit => credit - debit,
    }
}
