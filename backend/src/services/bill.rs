//! Vendor and bill service (accounts payable)

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::account::{account_id_by_code_tx, codes};
use crate::services::journal::{next_document_number, post_lines_tx};
use shared::models::{Bill, JournalLineInput, PaymentMethod, SettlementStatus, Vendor};
use shared::validation::validate_phone;

/// Vendor and bill service
#[derive(Clone)]
pub struct BillService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct VendorRow {
    id: Uuid,
    name: String,
    phone: Option<String>,
    address: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<VendorRow> for Vendor {
    fn from(row: VendorRow) -> Self {
        Vendor {
            id: row.id,
            name: row.name,
            phone: row.phone,
            address: row.address,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: Uuid,
    bill_number: String,
    vendor_id: Uuid,
    bill_date: NaiveDate,
    due_date: Option<NaiveDate>,
    total_amount: Decimal,
    paid_amount: Decimal,
    status: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

const BILL_COLUMNS: &str = "id, bill_number, vendor_id, bill_date, due_date, total_amount, \
     paid_amount, status, description, created_at";

impl TryFrom<BillRow> for Bill {
    type Error = AppError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let status = SettlementStatus::from_str(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown bill status: {}", row.status)))?;
        Ok(Bill {
            id: row.id,
            bill_number: row.bill_number,
            vendor_id: row.vendor_id,
            bill_date: row.bill_date,
            due_date: row.due_date,
            total_amount: row.total_amount,
            paid_amount: row.paid_amount,
            status,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

/// Input for creating or updating a vendor
#[derive(Debug, Deserialize)]
pub struct VendorInput {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Input for recording a vendor bill
///
/// `expense_account_id` is the account the bill is charged to, typically a
/// materials or expense account.
#[derive(Debug, Deserialize)]
pub struct CreateBillInput {
    pub vendor_id: Uuid,
    pub bill_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total_amount: Decimal,
    pub expense_account_id: Uuid,
    pub description: Option<String>,
}

/// Input for paying a bill
#[derive(Debug, Deserialize)]
pub struct BillPaymentInput {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
}

impl BillService {
    /// Create a new BillService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a vendor
    pub async fn create_vendor(&self, input: VendorInput) -> AppResult<Vendor> {
        validate_vendor(&input)?;

        let row = sqlx::query_as::<_, VendorRow>(
            r#"
            INSERT INTO vendors (name, phone, address)
            VALUES ($1, $2, $3)
            RETURNING id, name, phone, address, is_active, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// List active vendors
    pub async fn list_vendors(&self) -> AppResult<Vec<Vendor>> {
        let rows = sqlx::query_as::<_, VendorRow>(
            r#"
            SELECT id, name, phone, address, is_active, created_at
            FROM vendors
            WHERE is_active = true
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Vendor::from).collect())
    }

    /// Update a vendor
    pub async fn update_vendor(&self, vendor_id: Uuid, input: VendorInput) -> AppResult<Vendor> {
        validate_vendor(&input)?;

        let row = sqlx::query_as::<_, VendorRow>(
            r#"
            UPDATE vendors SET name = $1, phone = $2, address = $3
            WHERE id = $4
            RETURNING id, name, phone, address, is_active, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.phone)
        .bind(&input.address)
        .bind(vendor_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendor".to_string()))?;

        Ok(row.into())
    }

    /// Deactivate a vendor; bills already recorded keep referencing it
    pub async fn deactivate_vendor(&self, vendor_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE vendors SET is_active = false WHERE id = $1")
            .bind(vendor_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vendor".to_string()));
        }
        Ok(())
    }

    /// Record a vendor bill
    ///
    /// Posts expense debit against accounts payable credit and numbers the
    /// bill BILL-YYYY-NNNN.
    pub async fn create_bill(&self, input: CreateBillInput) -> AppResult<Bill> {
        if input.total_amount <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "total_amount".to_string(),
                message: "Bill amount must be positive".to_string(),
                message_id: "Jumlah tagihan harus lebih dari nol".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let vendor_active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM vendors WHERE id = $1",
        )
        .bind(input.vendor_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendor".to_string()))?;
        if !vendor_active {
            return Err(AppError::Validation {
                field: "vendor_id".to_string(),
                message: "Vendor is inactive".to_string(),
                message_id: "Pemasok tidak aktif".to_string(),
            });
        }

        let payable = account_id_by_code_tx(&mut tx, codes::ACCOUNTS_PAYABLE).await?;
        let bill_number = next_document_number(&mut tx, "BILL", input.bill_date.year()).await?;

        let lines = vec![
            JournalLineInput {
                account_id: input.expense_account_id,
                debit: input.total_amount,
                credit: Decimal::ZERO,
                memo: input.description.clone(),
            },
            JournalLineInput {
                account_id: payable,
                debit: Decimal::ZERO,
                credit: input.total_amount,
                memo: Some(format!("Bill {}", bill_number)),
            },
        ];
        let entry_id = post_lines_tx(
            &mut tx,
            input.bill_date,
            &format!("Vendor bill {}", bill_number),
            Some(&bill_number),
            &lines,
            None,
        )
        .await?;

        let row = sqlx::query_as::<_, BillRow>(&format!(
            r#"
            INSERT INTO bills
                (bill_number, vendor_id, bill_date, due_date, total_amount,
                 paid_amount, status, description, journal_entry_id)
            VALUES ($1, $2, $3, $4, $5, 0, 'unpaid', $6, $7)
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(&bill_number)
        .bind(input.vendor_id)
        .bind(input.bill_date)
        .bind(input.due_date)
        .bind(input.total_amount)
        .bind(&input.description)
        .bind(entry_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Get one bill
    pub async fn get_bill(&self, bill_id: Uuid) -> AppResult<Bill> {
        let row = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE id = $1"
        ))
        .bind(bill_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bill".to_string()))?;

        row.try_into()
    }

    /// List bills, optionally only those still owed
    pub async fn list_bills(&self, outstanding_only: bool) -> AppResult<Vec<Bill>> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            r#"
            SELECT {BILL_COLUMNS} FROM bills
            WHERE NOT $1 OR status IN ('unpaid', 'partial')
            ORDER BY due_date NULLS LAST, bill_date DESC
            "#
        ))
        .bind(outstanding_only)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Pay a bill, fully or in part
    pub async fn pay_bill(&self, bill_id: Uuid, input: BillPaymentInput) -> AppResult<Bill> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: "Payment amount must be positive".to_string(),
                message_id: "Jumlah pembayaran harus lebih dari nol".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let current = lock_bill_tx(&mut tx, bill_id).await?;

        let status = SettlementStatus::from_str(&current.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown bill status: {}", current.status))
        })?;
        if status == SettlementStatus::Void {
            return Err(AppError::InvalidStateTransition(format!(
                "Bill {} is void and cannot be paid",
                current.bill_number
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
        let payable = account_id_by_code_tx(&mut tx, codes::ACCOUNTS_PAYABLE).await?;

        let lines = vec![
            JournalLineInput {
                account_id: payable,
                debit: input.amount,
                credit: Decimal::ZERO,
                memo: Some(format!("Payment for {}", current.bill_number)),
            },
            JournalLineInput {
                account_id: cash_account,
                debit: Decimal::ZERO,
                credit: input.amount,
                memo: Some(format!("Payment for {}", current.bill_number)),
            },
        ];
        let entry_id = post_lines_tx(
            &mut tx,
            input.payment_date,
            &format!("Payment for bill {}", current.bill_number),
            Some(&current.bill_number),
            &lines,
            None,
        )
        .await?;

        sqlx::query(
            r#"
            INSERT INTO payments (bill_id, amount, method, payment_date, journal_entry_id, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(bill_id)
        .bind(input.amount)
        .bind(input.method.as_str())
        .bind(input.payment_date)
        .bind(entry_id)
        .bind(&input.note)
        .execute(&mut *tx)
        .await?;

        let new_paid = current.paid_amount + input.amount;
        let new_status = SettlementStatus::derive(current.total_amount, new_paid);
        let row = sqlx::query_as::<_, BillRow>(&format!(
            r#"
            UPDATE bills SET paid_amount = $1, status = $2
            WHERE id = $3
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(new_paid)
        .bind(new_status.as_str())
        .bind(bill_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }
}

fn validate_vendor(input: &VendorInput) -> AppResult<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation {
            field: "name".to_string(),
            message: "Vendor name is required".to_string(),
            message_id: "Nama pemasok wajib diisi".to_string(),
        });
    }
    if let Some(phone) = &input.phone {
        validate_phone(phone).map_err(|message| AppError::Validation {
            field: "phone".to_string(),
            message: message.to_string(),
            message_id: "Nomor telepon tidak valid".to_string(),
        })?;
    }
    Ok(())
}

async fn lock_bill_tx(tx: &mut Transaction<'_, Postgres>, bill_id: Uuid) -> AppResult<BillRow> {
    sqlx::query_as::<_, BillRow>(&format!(
        "SELECT {BILL_COLUMNS} FROM bills WHERE id = $1 FOR UPDATE"
    ))
    .bind(bill_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Bill".to_string()))
}
