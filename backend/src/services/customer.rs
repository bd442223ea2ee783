//! Customer service

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Customer, CustomerInput};
use shared::types::Pagination;
use shared::validation::{validate_email, validate_phone};

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const CUSTOMER_COLUMNS: &str =
    "id, name, phone, email, address, is_active, created_at, updated_at";

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl CustomerService {
    /// Create a new CustomerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a customer; the phone number must be unique when given
    pub async fn create_customer(&self, input: CustomerInput) -> AppResult<Customer> {
        validate_input(&input)?;

        if let Some(phone) = &input.phone {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM customers WHERE phone = $1",
            )
            .bind(phone)
            .fetch_one(&self.db)
            .await?;
            if exists > 0 {
                return Err(AppError::DuplicateEntry(format!(
                    "Customer with phone {} already exists",
                    phone
                )));
            }
        }

        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            INSERT INTO customers (name, phone, email, address)
            VALUES ($1, $2, $3, $4)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get one customer
    pub async fn get_customer(&self, customer_id: Uuid) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(row.into())
    }

    /// List customers with name search, newest first
    pub async fn list_customers(
        &self,
        search: Option<&str>,
        pagination: &Pagination,
    ) -> AppResult<(Vec<Customer>, i64)> {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM customers WHERE $1::text IS NULL OR name ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS} FROM customers
            WHERE $1::text IS NULL OR name ILIKE $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok((rows.into_iter().map(Customer::from).collect(), total))
    }

    /// Update a customer
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: CustomerInput,
    ) -> AppResult<Customer> {
        validate_input(&input)?;

        if let Some(phone) = &input.phone {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM customers WHERE phone = $1 AND id <> $2",
            )
            .bind(phone)
            .bind(customer_id)
            .fetch_one(&self.db)
            .await?;
            if taken > 0 {
                return Err(AppError::DuplicateEntry(format!(
                    "Customer with phone {} already exists",
                    phone
                )));
            }
        }

        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            UPDATE customers
            SET name = $1, phone = $2, email = $3, address = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(row.into())
    }

    /// Deactivate a customer; existing orders keep referencing it
    pub async fn deactivate_customer(&self, customer_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET is_active = false, updated_at = NOW() WHERE id = $1",
        )
        .bind(customer_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }
        Ok(())
    }
}

fn validate_input(input: &CustomerInput) -> AppResult<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation {
            field: "name".to_string(),
            message: "Customer name is required".to_string(),
            message_id: "Nama pelanggan wajib diisi".to_string(),
        });
    }
    if let Some(phone) = &input.phone {
        validate_phone(phone).map_err(|message| AppError::Validation {
            field: "phone".to_string(),
            message: message.to_string(),
            message_id: "Nomor telepon tidak valid".to_string(),
        })?;
    }
    if let Some(email) = &input.email {
        validate_email(email).map_err(|message| AppError::Validation {
            field: "email".to_string(),
            message: message.to_string(),
            message_id: "Alamat email tidak valid".to_string(),
        })?;
    }
    Ok(())
}
