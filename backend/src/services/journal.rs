//! Journal entry service
//!
//! Every posting in the system, manual or automatic (settlements, down
//! payments, depreciation), flows through `post_lines_tx` so the balance
//! invariant and period gating are enforced in exactly one place.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::period::ensure_period_open_tx;
use shared::models::{JournalEntry, JournalEntryItem, JournalLineInput, JournalStatus};
use shared::validation::{balance_difference, validate_balanced};

/// Journal service
#[derive(Clone)]
pub struct JournalService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    entry_number: String,
    entry_date: NaiveDate,
    description: String,
    reference: Option<String>,
    status: String,
    reversal_of: Option<Uuid>,
    posted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for JournalEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let status = JournalStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown journal status: {}", row.status))
        })?;
        Ok(JournalEntry {
            id: row.id,
            entry_number: row.entry_number,
            entry_date: row.entry_date,
            description: row.description,
            reference: row.reference,
            status,
            reversal_of: row.reversal_of,
            posted_at: row.posted_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    entry_id: Uuid,
    account_id: Uuid,
    debit: rust_decimal::Decimal,
    credit: rust_decimal::Decimal,
    memo: Option<String>,
}

impl From<ItemRow> for JournalEntryItem {
    fn from(row: ItemRow) -> Self {
        JournalEntryItem {
            id: row.id,
            entry_id: row.entry_id,
            account_id: row.account_id,
            debit: row.debit,
            credit: row.credit,
            memo: row.memo,
        }
    }
}

/// A journal entry with its lines
#[derive(Debug, Serialize)]
pub struct EntryWithItems {
    #[serde(flatten)]
    pub entry: JournalEntry,
    pub items: Vec<JournalEntryItem>,
}

/// Input for creating a draft journal entry
#[derive(Debug, Deserialize)]
pub struct CreateEntryInput {
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub lines: Vec<JournalLineInput>,
}

/// Input for voiding a posted entry
#[derive(Debug, Deserialize)]
pub struct VoidEntryInput {
    /// Date the reversing entry is posted on; must fall in an open period
    pub void_date: NaiveDate,
    pub reason: Option<String>,
}

impl JournalService {
    /// Create a new JournalService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a draft journal entry
    pub async fn create_entry(&self, input: CreateEntryInput) -> AppResult<EntryWithItems> {
        check_lines(&input.lines)?;
        if input.description.trim().is_empty() {
            return Err(AppError::Validation {
                field: "description".to_string(),
                message: "Description is required".to_string(),
                message_id: "Keterangan wajib diisi".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        verify_accounts_tx(&mut tx, &input.lines).await?;

        let entry_number = next_document_number(&mut tx, "JE", input.entry_date.year()).await?;
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            INSERT INTO journal_entries (entry_number, entry_date, description, reference, status)
            VALUES ($1, $2, $3, $4, 'draft')
            RETURNING id, entry_number, entry_date, description, reference, status,
                      reversal_of, posted_at, created_at
            "#,
        )
        .bind(&entry_number)
        .bind(input.entry_date)
        .bind(input.description.trim())
        .bind(&input.reference)
        .fetch_one(&mut *tx)
        .await?;

        let items = insert_items_tx(&mut tx, row.id, &input.lines).await?;
        tx.commit().await?;

        Ok(EntryWithItems {
            entry: row.try_into()?,
            items,
        })
    }

    /// Get an entry with its lines
    pub async fn get_entry(&self, entry_id: Uuid) -> AppResult<EntryWithItems> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, entry_number, entry_date, description, reference, status,
                   reversal_of, posted_at, created_at
            FROM journal_entries
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Journal entry".to_string()))?;

        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, entry_id, account_id, debit, credit, memo
            FROM journal_entry_items
            WHERE entry_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(entry_id)
        .fetch_all(&self.db)
        .await?;

        Ok(EntryWithItems {
            entry: row.try_into()?,
            items: items.into_iter().map(|r| r.into()).collect(),
        })
    }

    /// List entries, optionally filtered by status, newest first
    pub async fn list_entries(&self, status: Option<JournalStatus>) -> AppResult<Vec<JournalEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, entry_number, entry_date, description, reference, status,
                   reversal_of, posted_at, created_at
            FROM journal_entries
            WHERE $1::TEXT IS NULL OR status = $1
            ORDER BY entry_date DESC, entry_number DESC
            "#,
        )
        .bind(status.map(|s| s.as_str().to_string()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Post a draft entry
    ///
    /// Re-validates the balance and the period before flipping the status.
    pub async fn post_entry(&self, entry_id: Uuid) -> AppResult<EntryWithItems> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, entry_number, entry_date, description, reference, status,
                   reversal_of, posted_at, created_at
            FROM journal_entries
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Journal entry".to_string()))?;

        if row.status != JournalStatus::Draft.as_str() {
            return Err(AppError::InvalidStateTransition(format!(
                "Only draft entries can be posted, entry {} is {}",
                row.entry_number, row.status
            )));
        }

        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, entry_id, account_id, debit, credit, memo
            FROM journal_entry_items
            WHERE entry_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(entry_id)
        .fetch_all(&mut *tx)
        .await?;

        let lines: Vec<JournalLineInput> = items
            .iter()
            .map(|i| JournalLineInput {
                account_id: i.account_id,
                debit: i.debit,
                credit: i.credit,
                memo: i.memo.clone(),
            })
            .collect();
        check_lines(&lines)?;
        ensure_period_open_tx(&mut tx, row.entry_date).await?;

        let posted = sqlx::query_as::<_, EntryRow>(
            r#"
            UPDATE journal_entries
            SET status = 'posted', posted_at = NOW()
            WHERE id = $1
            RETURNING id, entry_number, entry_date, description, reference, status,
                      reversal_of, posted_at, created_at
            "#,
        )
        .bind(entry_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(EntryWithItems {
            entry: posted.try_into()?,
            items: items.into_iter().map(|r| r.into()).collect(),
        })
    }

    /// Void a posted entry by creating and posting a reversing entry
    ///
    /// Posted history stays immutable: the original flips to void and a new
    /// entry with the debit/credit sides swapped is posted, linked through
    /// `reversal_of`.
    pub async fn void_entry(
        &self,
        entry_id: Uuid,
        input: VoidEntryInput,
    ) -> AppResult<EntryWithItems> {
        let mut tx = self.db.begin().await?;

        let reversal_id =
            void_entry_tx(&mut tx, entry_id, input.void_date, input.reason.as_deref()).await?;

        let reversal = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, entry_number, entry_date, description, reference, status,
                   reversal_of, posted_at, created_at
            FROM journal_entries
            WHERE id = $1
            "#,
        )
        .bind(reversal_id)
        .fetch_one(&mut *tx)
        .await?;
        let reversal_items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, entry_id, account_id, debit, credit, memo
            FROM journal_entry_items
            WHERE entry_id = $1
            "#,
        )
        .bind(reversal_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(EntryWithItems {
            entry: reversal.try_into()?,
            items: reversal_items.into_iter().map(|r| r.into()).collect(),
        })
    }
}

/// Validate lines through the shared balance rules
fn check_lines(lines: &[JournalLineInput]) -> AppResult<()> {
    if let Err(msg) = validate_balanced(lines) {
        if msg.contains("not balanced") {
            return Err(AppError::UnbalancedEntry {
                difference: balance_difference(lines),
            });
        }
        return Err(AppError::Validation {
            field: "lines".to_string(),
            message: msg.to_string(),
            message_id: "Baris jurnal tidak valid".to_string(),
        });
    }
    Ok(())
}

/// Verify all referenced accounts exist and are active
async fn verify_accounts_tx(
    tx: &mut Transaction<'_, Postgres>,
    lines: &[JournalLineInput],
) -> AppResult<()> {
    let ids: Vec<Uuid> = lines.iter().map(|l| l.account_id).collect();
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT id) FROM chart_of_accounts WHERE id = ANY($1) AND is_active",
    )
    .bind(&ids)
    .fetch_one(&mut **tx)
    .await?;

    let distinct: std::collections::HashSet<Uuid> = ids.iter().copied().collect();
    if found as usize != distinct.len() {
        return Err(AppError::Validation {
            field: "lines".to_string(),
            message: "One or more accounts do not exist or are inactive".to_string(),
            message_id: "Ada akun yang tidak ditemukan atau nonaktif".to_string(),
        });
    }
    Ok(())
}

async fn insert_items_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    lines: &[JournalLineInput],
) -> AppResult<Vec<JournalEntryItem>> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO journal_entry_items (entry_id, account_id, debit, credit, memo)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, entry_id, account_id, debit, credit, memo
            "#,
        )
        .bind(entry_id)
        .bind(line.account_id)
        .bind(line.debit)
        .bind(line.credit)
        .bind(&line.memo)
        .fetch_one(&mut **tx)
        .await?;
        items.push(row.into());
    }
    Ok(items)
}

/// Next document number in the `PREFIX-YYYY-NNNN` scheme
pub async fn next_document_number(
    tx: &mut Transaction<'_, Postgres>,
    prefix: &str,
    year: i32,
) -> AppResult<String> {
    let sequence: i32 = sqlx::query_scalar("SELECT get_next_doc_sequence($1, $2)")
        .bind(prefix)
        .bind(year)
        .fetch_one(&mut **tx)
        .await?;
    Ok(format!("{}-{}-{:04}", prefix, year, sequence))
}

/// Void a posted entry inside an existing transaction
///
/// Creates and posts a reversing entry with the sides swapped, flips the
/// original to void, and returns the reversal's id.
pub async fn void_entry_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    void_date: NaiveDate,
    reason: Option<&str>,
) -> AppResult<Uuid> {
    let row = sqlx::query_as::<_, EntryRow>(
        r#"
        SELECT id, entry_number, entry_date, description, reference, status,
               reversal_of, posted_at, created_at
        FROM journal_entries
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(entry_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Journal entry".to_string()))?;

    if row.status != JournalStatus::Posted.as_str() {
        return Err(AppError::InvalidStateTransition(format!(
            "Only posted entries can be voided, entry {} is {}",
            row.entry_number, row.status
        )));
    }

    let items = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT id, entry_id, account_id, debit, credit, memo
        FROM journal_entry_items
        WHERE entry_id = $1
        "#,
    )
    .bind(entry_id)
    .fetch_all(&mut **tx)
    .await?;

    // Reversal: swap sides
    let reversed: Vec<JournalLineInput> = items
        .iter()
        .map(|i| JournalLineInput {
            account_id: i.account_id,
            debit: i.credit,
            credit: i.debit,
            memo: i.memo.clone(),
        })
        .collect();

    let description = match reason {
        Some(reason) => format!("Reversal of {}: {}", row.entry_number, reason),
        None => format!("Reversal of {}", row.entry_number),
    };

    let reversal_id = post_lines_tx(
        tx,
        void_date,
        &description,
        row.reference.as_deref(),
        &reversed,
        Some(entry_id),
    )
    .await?;

    sqlx::query("UPDATE journal_entries SET status = 'void' WHERE id = $1")
        .bind(entry_id)
        .execute(&mut **tx)
        .await?;

    Ok(reversal_id)
}

/// Create and post a balanced entry inside an existing transaction
///
/// Used by every automatic posting (settlements, down payments,
/// depreciation) and by void reversals.
pub async fn post_lines_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_date: NaiveDate,
    description: &str,
    reference: Option<&str>,
    lines: &[JournalLineInput],
    reversal_of: Option<Uuid>,
) -> AppResult<Uuid> {
    check_lines(lines)?;
    verify_accounts_tx(tx, lines).await?;
    ensure_period_open_tx(tx, entry_date).await?;

    let entry_number = next_document_number(tx, "JE", entry_date.year()).await?;
    let entry_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO journal_entries
            (entry_number, entry_date, description, reference, status, reversal_of, posted_at)
        VALUES ($1, $2, $3, $4, 'posted', $5, NOW())
        RETURNING id
        "#,
    )
    .bind(&entry_number)
    .bind(entry_date)
    .bind(description)
    .bind(reference)
    .bind(reversal_of)
    .fetch_one(&mut **tx)
    .await?;

    insert_items_tx(tx, entry_id, lines).await?;
    Ok(entry_id)
}
