//! Invoice service (accounts receivable)
//!
//! Invoices are issued from orders. Down payments already held as customer
//! deposits are applied at issue time, so the outstanding amount always
//! reflects what the customer still owes.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::account::{account_id_by_code_tx, codes};
use crate::services::journal::{next_document_number, post_lines_tx, void_entry_tx};
use shared::models::{
    Invoice, JournalLineInput, PaymentMethod, ProductionStatus, SettlementStatus,
};

/// Invoice service
#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    invoice_number: String,
    order_id: Uuid,
    customer_id: Uuid,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    total_amount: Decimal,
    paid_amount: Decimal,
    status: String,
    journal_entry_id: Uuid,
    created_at: DateTime<Utc>,
}

const INVOICE_COLUMNS: &str = "id, invoice_number, order_id, customer_id, issue_date, due_date, \
     total_amount, paid_amount, status, journal_entry_id, created_at";

impl TryFrom<InvoiceRow> for Invoice {
    type Error = AppError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let status = SettlementStatus::from_str(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown invoice status: {}", row.status)))?;
        Ok(Invoice {
            id: row.id,
            invoice_number: row.invoice_number,
            order_id: row.order_id,
            customer_id: row.customer_id,
            issue_date: row.issue_date,
            due_date: row.due_date,
            total_amount: row.total_amount,
            paid_amount: row.paid_amount,
            status,
            created_at: row.created_at,
        })
    }
}

/// Input for issuing an invoice from an order
#[derive(Debug, Deserialize)]
pub struct IssueInvoiceInput {
    pub order_id: Uuid,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
}

/// Input for recording an invoice payment
#[derive(Debug, Deserialize)]
pub struct InvoicePaymentInput {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
}

/// Input for voiding an unpaid invoice
#[derive(Debug, Deserialize)]
pub struct VoidInvoiceInput {
    pub void_date: NaiveDate,
    pub reason: Option<String>,
}

impl InvoiceService {
    /// Create a new InvoiceService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Issue an invoice for an order, applying any accumulated down payment
    ///
    /// Posts one entry: accounts receivable is debited for the order total,
    /// revenue credited, and the held deposit (if any) is moved from
    /// customer deposits onto the receivable.
    pub async fn issue_from_order(&self, input: IssueInvoiceInput) -> AppResult<Invoice> {
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, (String, Uuid, String, Decimal, Decimal, bool)>(
            r#"
            SELECT spk_number, customer_id, status, total_amount, down_payment, is_cancelled
            FROM orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(input.order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let (spk_number, customer_id, status, total_amount, down_payment, is_cancelled) = order;
        if is_cancelled {
            return Err(AppError::Conflict {
                resource: "order".to_string(),
                message: "Cannot invoice a cancelled order".to_string(),
                message_id: "Pesanan sudah dibatalkan".to_string(),
            });
        }
        if ProductionStatus::from_str(&status).is_none() {
            return Err(AppError::Internal(format!("Unknown order status: {}", status)));
        }
        if total_amount <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "order_id".to_string(),
                message: "Order total must be positive to invoice".to_string(),
                message_id: "Total pesanan harus lebih dari nol".to_string(),
            });
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM invoices WHERE order_id = $1 AND status <> 'void'",
        )
        .bind(input.order_id)
        .fetch_one(&mut *tx)
        .await?;
        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "invoice".to_string(),
                message: format!("Order {} is already invoiced", spk_number),
                message_id: format!("Pesanan {} sudah memiliki faktur", spk_number),
            });
        }

        let receivable = account_id_by_code_tx(&mut tx, codes::ACCOUNTS_RECEIVABLE).await?;
        let revenue = account_id_by_code_tx(&mut tx, codes::SALES_REVENUE).await?;

        let mut lines = vec![
            JournalLineInput {
                account_id: receivable,
                debit: total_amount,
                credit: Decimal::ZERO,
                memo: Some(format!("Invoice for {}", spk_number)),
            },
            JournalLineInput {
                account_id: revenue,
                debit: Decimal::ZERO,
                credit: total_amount,
                memo: Some(format!("Revenue for {}", spk_number)),
            },
        ];
        if down_payment > Decimal::ZERO {
            let deposits = account_id_by_code_tx(&mut tx, codes::CUSTOMER_DEPOSITS).await?;
            lines.push(JournalLineInput {
                account_id: deposits,
                debit: down_payment,
                credit: Decimal::ZERO,
                memo: Some(format!("Apply DP for {}", spk_number)),
            });
            lines.push(JournalLineInput {
                account_id: receivable,
                debit: Decimal::ZERO,
                credit: down_payment,
                memo: Some(format!("Apply DP for {}", spk_number)),
            });
        }

        let invoice_number =
            next_document_number(&mut tx, "INV", input.issue_date.year()).await?;
        let entry_id = post_lines_tx(
            &mut tx,
            input.issue_date,
            &format!("Invoice {} for order {}", invoice_number, spk_number),
            Some(&invoice_number),
            &lines,
            None,
        )
        .await?;

        let status = SettlementStatus::derive(total_amount, down_payment);
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            INSERT INTO invoices
                (invoice_number, order_id, customer_id, issue_date, due_date,
                 total_amount, paid_amount, status, journal_entry_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(&invoice_number)
        .bind(input.order_id)
        .bind(customer_id)
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(total_amount)
        .bind(down_payment)
        .bind(status.as_str())
        .bind(entry_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Get one invoice
    pub async fn get_invoice(&self, invoice_id: Uuid) -> AppResult<Invoice> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        row.try_into()
    }

    /// List invoices, optionally only those still outstanding
    pub async fn list_invoices(&self, outstanding_only: bool) -> AppResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS} FROM invoices
            WHERE NOT $1 OR status IN ('unpaid', 'partial')
            ORDER BY due_date NULLS LAST, issue_date DESC
            "#
        ))
        .bind(outstanding_only)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Record a settlement against an invoice
    ///
    /// Overpayment is rejected; the payment and its journal entry (cash or
    /// bank against accounts receivable) land in one transaction.
    pub async fn record_payment(
        &self,
        invoice_id: Uuid,
        input: InvoicePaymentInput,
    ) -> AppResult<Invoice> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: "Payment amount must be positive".to_string(),
                message_id: "Jumlah pembayaran harus lebih dari nol".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let current = lock_invoice_tx(&mut tx, invoice_id).await?;

        let status = SettlementStatus::from_str(&current.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown invoice status: {}", current.status))
        })?;
        if status == SettlementStatus::Void {
            return Err(AppError::InvalidStateTransition(format!(
                "Invoice {} is void and cannot be paid",
                current.invoice_number
            )));
        }
        let outstanding = current.total_amount - current.paid_amount;
        if input.amount > outstanding {
            return Err(AppError::Overpayment {
                message: format!(
                    "Payment {} exceeds the outstanding amount {}",
                    input.amount, outstanding
                ),
                message_id: format!(
                    "Pembayaran {} melebihi sisa tagihan {}",
                    input.amount, outstanding
                ),
            });
        }

        let cash_code = match input.method {
            PaymentMethod::Cash => codes::CASH,
            PaymentMethod::Transfer => codes::BANK,
        };
        let cash_account = account_id_by_code_tx(&mut tx, cash_code).await?;
        let receivable = account_id_by_code_tx(&mut tx, codes::ACCOUNTS_RECEIVABLE).await?;

        let lines = vec![
            JournalLineInput {
                account_id: cash_account,
                debit: input.amount,
                credit: Decimal::ZERO,
                memo: Some(format!("Payment for {}", current.invoice_number)),
            },
            JournalLineInput {
                account_id: receivable,
                debit: Decimal::ZERO,
                credit: input.amount,
                memo: Some(format!("Payment for {}", current.invoice_number)),
            },
        ];
        let entry_id = post_lines_tx(
            &mut tx,
            input.payment_date,
            &format!("Payment for invoice {}", current.invoice_number),
            Some(&current.invoice_number),
            &lines,
            None,
        )
        .await?;

        sqlx::query(
            r#"
            INSERT INTO payments (invoice_id, amount, method, payment_date, journal_entry_id, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(invoice_id)
        .bind(input.amount)
        .bind(input.method.as_str())
        .bind(input.payment_date)
        .bind(entry_id)
        .bind(&input.note)
        .execute(&mut *tx)
        .await?;

        let new_paid = current.paid_amount + input.amount;
        let new_status = SettlementStatus::derive(current.total_amount, new_paid);
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            UPDATE invoices SET paid_amount = $1, status = $2
            WHERE id = $3
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(new_paid)
        .bind(new_status.as_str())
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Void an invoice that has not received payments
    ///
    /// The issuance entry is reversed so the receivable and revenue are
    /// backed out of the ledger.
    pub async fn void_invoice(
        &self,
        invoice_id: Uuid,
        input: VoidInvoiceInput,
    ) -> AppResult<Invoice> {
        let mut tx = self.db.begin().await?;
        let current = lock_invoice_tx(&mut tx, invoice_id).await?;

        let status = SettlementStatus::from_str(&current.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown invoice status: {}", current.status))
        })?;
        if status == SettlementStatus::Void {
            return Err(AppError::Conflict {
                resource: "invoice".to_string(),
                message: "Invoice is already void".to_string(),
                message_id: "Faktur sudah dibatalkan".to_string(),
            });
        }

        let payments = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM payments WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;
        if payments > 0 {
            return Err(AppError::Conflict {
                resource: "invoice".to_string(),
                message: "Invoice has payments and cannot be voided".to_string(),
                message_id: "Faktur sudah memiliki pembayaran".to_string(),
            });
        }

        void_entry_tx(
            &mut tx,
            current.journal_entry_id,
            input.void_date,
            input.reason.as_deref(),
        )
        .await?;

        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "UPDATE invoices SET status = 'void' WHERE id = $1 RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }
}

async fn lock_invoice_tx(
    tx: &mut Transaction<'_, Postgres>,
    invoice_id: Uuid,
) -> AppResult<InvoiceRow> {
    sqlx::query_as::<_, InvoiceRow>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 FOR UPDATE"
    ))
    .bind(invoice_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
}
