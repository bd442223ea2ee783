//! Order management service: SPK numbers, items, down payments

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::account::{account_id_by_code_tx, codes};
use crate::services::journal::post_lines_tx;
use shared::models::{
    CreateOrderInput, JournalLineInput, Order, OrderItem, OrderItemInput, PaymentMethod,
    ProductionRoute, ProductionStatus,
};

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub spk_number: String,
    pub customer_id: Uuid,
    pub order_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub route: String,
    pub total_amount: Decimal,
    pub down_payment: Decimal,
    pub is_cancelled: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const ORDER_COLUMNS: &str = "id, spk_number, customer_id, order_date, due_date, \
     status, route, total_amount, down_payment, is_cancelled, notes, created_at, updated_at";

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = ProductionStatus::from_str(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown order status: {}", row.status)))?;
        let route = ProductionRoute::from_str(&row.route)
            .ok_or_else(|| AppError::Internal(format!("Unknown order route: {}", row.route)))?;
        Ok(Order {
            id: row.id,
            spk_number: row.spk_number,
            customer_id: row.customer_id,
            order_date: row.order_date,
            due_date: row.due_date,
            status,
            route,
            total_amount: row.total_amount,
            down_payment: row.down_payment,
            is_cancelled: row.is_cancelled,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    category_id: Uuid,
    product_name: String,
    quantity: Decimal,
    unit_price: Decimal,
    line_total: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            category_id: row.category_id,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            line_total: row.line_total,
        }
    }
}

/// An order with its line items
#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Input for updating a draft order
///
/// `due_date` and `notes` distinguish an absent field (keep the current
/// value) from an explicit null (clear it).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateOrderInput {
    #[serde(deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub items: Option<Vec<OrderItemInput>>,
    #[serde(deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

/// Deserialize a present field (including null) as `Some`; an absent
/// field falls back to the `None` default.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::deserialize(deserializer).map(Some)
}

/// Apply one patch field: absent keeps, null clears, a value replaces
fn patch_field<T>(patch: Option<Option<T>>, current: Option<T>) -> Option<T> {
    match patch {
        Some(value) => value,
        None => current,
    }
}

/// Input for recording a down payment
#[derive(Debug, Deserialize)]
pub struct DownPaymentInput {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
}

/// Filters for listing orders
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<ProductionStatus>,
    pub customer_id: Option<Uuid>,
    pub include_cancelled: Option<bool>,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an order in Draft with a fresh SPK number
    pub async fn create_order(
        &self,
        actor: Uuid,
        input: CreateOrderInput,
    ) -> AppResult<OrderWithItems> {
        validate_items(&input.items)?;

        let customer_active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM customers WHERE id = $1",
        )
        .bind(input.customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;
        if !customer_active {
            return Err(AppError::Validation {
                field: "customer_id".to_string(),
                message: "Customer is inactive".to_string(),
                message_id: "Pelanggan sudah nonaktif".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let route = derive_route_tx(&mut tx, &input.items).await?;

        let year = input.order_date.year();
        let sequence: i32 = sqlx::query_scalar("SELECT get_next_doc_sequence($1, $2)")
            .bind("SPK")
            .bind(year)
            .fetch_one(&mut *tx)
            .await?;
        let spk_number = format!("SPK-{}-{:04}", year, sequence);

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (spk_number, customer_id, order_date, due_date, status, route,
                                total_amount, down_payment, notes)
            VALUES ($1, $2, $3, $4, 'draft', $5, $6, 0, $7)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&spk_number)
        .bind(input.customer_id)
        .bind(input.order_date)
        .bind(input.due_date)
        .bind(route.as_str())
        .bind(input.total())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let items = insert_items_tx(&mut tx, row.id, &input.items).await?;
        append_history_tx(
            &mut tx,
            row.id,
            None,
            ProductionStatus::Draft,
            Some(actor),
            Some("Order created"),
        )
        .await?;
        tx.commit().await?;

        Ok(OrderWithItems {
            order: row.try_into()?,
            items,
        })
    }

    /// Get an order with its items
    pub async fn get_order(&self, order_id: Uuid) -> AppResult<OrderWithItems> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let items = self.items_for(order_id).await?;
        Ok(OrderWithItems {
            order: row.try_into()?,
            items,
        })
    }

    /// Look an order up by SPK number (used by the WhatsApp quick command)
    pub async fn find_by_spk(&self, spk_number: &str) -> AppResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE spk_number = $1"
        ))
        .bind(spk_number)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        row.try_into()
    }

    /// List orders, newest first
    pub async fn list_orders(&self, filter: OrderFilter) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR customer_id = $2)
              AND (NOT is_cancelled OR $3)
            ORDER BY order_date DESC, spk_number DESC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str().to_string()))
        .bind(filter.customer_id)
        .bind(filter.include_cancelled.unwrap_or(false))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Update a Draft order; later statuses are immutable through this path
    pub async fn update_order(
        &self,
        order_id: Uuid,
        input: UpdateOrderInput,
    ) -> AppResult<OrderWithItems> {
        let mut tx = self.db.begin().await?;

        let current = lock_order_tx(&mut tx, order_id).await?;
        if current.status != ProductionStatus::Draft.as_str() {
            return Err(AppError::InvalidStateTransition(format!(
                "Only draft orders can be edited, order {} is {}",
                current.spk_number, current.status
            )));
        }

        let (route, total) = if let Some(items) = &input.items {
            validate_items(items)?;
            sqlx::query("DELETE FROM order_items WHERE order_id = $1")
                .bind(order_id)
                .execute(&mut *tx)
                .await?;
            insert_items_tx(&mut tx, order_id, items).await?;
            let route = derive_route_tx(&mut tx, items).await?;
            let total: Decimal = items.iter().map(|i| i.quantity * i.unit_price).sum();
            (route.as_str().to_string(), total)
        } else {
            (current.route.clone(), current.total_amount)
        };

        let due_date = patch_field(input.due_date, current.due_date);
        let notes = patch_field(input.notes, current.notes.clone());

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET due_date = $1,
                notes = $2,
                route = $3,
                total_amount = $4
            WHERE id = $5
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(due_date)
        .bind(&notes)
        .bind(&route)
        .bind(total)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let items = self.items_for(order_id).await?;
        Ok(OrderWithItems {
            order: row.try_into()?,
            items,
        })
    }

    /// Cancel an order before it completes production
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        actor: Uuid,
        reason: Option<String>,
    ) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;

        let current = lock_order_tx(&mut tx, order_id).await?;
        if current.is_cancelled {
            return Err(AppError::Conflict {
                resource: "order".to_string(),
                message: "Order is already cancelled".to_string(),
                message_id: "Pesanan sudah dibatalkan".to_string(),
            });
        }
        let status = ProductionStatus::from_str(&current.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown order status: {}", current.status))
        })?;
        if !status.is_in_production() {
            return Err(AppError::InvalidStateTransition(format!(
                "Order {} is already {} and can no longer be cancelled",
                current.spk_number, current.status
            )));
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET is_cancelled = TRUE WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        let note = match reason {
            Some(r) => format!("Cancelled: {}", r),
            None => "Cancelled".to_string(),
        };
        append_history_tx(&mut tx, order_id, Some(status), status, Some(actor), Some(&note))
            .await?;
        tx.commit().await?;

        row.try_into()
    }

    /// Record a down payment and post it to the journal
    ///
    /// Cash/bank is debited, customer deposits credited. Cumulative DP may
    /// never exceed the order total.
    pub async fn record_down_payment(
        &self,
        order_id: Uuid,
        input: DownPaymentInput,
    ) -> AppResult<Order> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: "Down payment must be positive".to_string(),
                message_id: "Uang muka harus lebih dari nol".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let current = lock_order_tx(&mut tx, order_id).await?;
        if current.is_cancelled {
            return Err(AppError::Conflict {
                resource: "order".to_string(),
                message: "Cannot take a down payment on a cancelled order".to_string(),
                message_id: "Pesanan sudah dibatalkan".to_string(),
            });
        }
        if current.down_payment + input.amount > current.total_amount {
            return Err(AppError::Overpayment {
                message: format!(
                    "Down payment would exceed the order total, outstanding {}",
                    current.total_amount - current.down_payment
                ),
                message_id: "Uang muka melebihi total pesanan".to_string(),
            });
        }

        let cash_code = match input.method {
            PaymentMethod::Cash => codes::CASH,
            PaymentMethod::Transfer => codes::BANK,
        };
        let cash_account = account_id_by_code_tx(&mut tx, cash_code).await?;
        let deposit_account = account_id_by_code_tx(&mut tx, codes::CUSTOMER_DEPOSITS).await?;

        let lines = vec![
            JournalLineInput {
                account_id: cash_account,
                debit: input.amount,
                credit: Decimal::ZERO,
                memo: Some(format!("DP {}", current.spk_number)),
            },
            JournalLineInput {
                account_id: deposit_account,
                debit: Decimal::ZERO,
                credit: input.amount,
                memo: Some(format!("DP {}", current.spk_number)),
            },
        ];
        let entry_id = post_lines_tx(
            &mut tx,
            input.payment_date,
            &format!("Down payment for {}", current.spk_number),
            Some(&current.spk_number),
            &lines,
            None,
        )
        .await?;

        sqlx::query(
            r#"
            INSERT INTO payments (order_id, amount, method, payment_date, journal_entry_id, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order_id)
        .bind(input.amount)
        .bind(input.method.as_str())
        .bind(input.payment_date)
        .bind(entry_id)
        .bind(&input.note)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders SET down_payment = down_payment + $1
            WHERE id = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(input.amount)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn items_for(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT id, order_id, category_id, product_name, quantity, unit_price, line_total
            FROM order_items
            WHERE order_id = $1
            ORDER BY product_name
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;
        Ok(items.into_iter().map(|r| r.into()).collect())
    }
}

fn validate_items(items: &[OrderItemInput]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::Validation {
            field: "items".to_string(),
            message: "An order needs at least one item".to_string(),
            message_id: "Pesanan harus memiliki minimal satu barang".to_string(),
        });
    }
    for item in items {
        if item.product_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "product_name".to_string(),
                message: "Product name is required".to_string(),
                message_id: "Nama produk wajib diisi".to_string(),
            });
        }
        if item.quantity <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity must be positive".to_string(),
                message_id: "Jumlah harus lebih dari nol".to_string(),
            });
        }
        if item.unit_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "unit_price".to_string(),
                message: "Unit price cannot be negative".to_string(),
                message_id: "Harga satuan tidak boleh negatif".to_string(),
            });
        }
    }
    Ok(())
}

/// Derive the production route from the items' category composition
async fn derive_route_tx(
    tx: &mut Transaction<'_, Postgres>,
    items: &[OrderItemInput],
) -> AppResult<ProductionRoute> {
    let ids: Vec<Uuid> = items.iter().map(|i| i.category_id).collect();
    let flags = sqlx::query_as::<_, (Uuid, bool, bool)>(
        r#"
        SELECT id, needs_press, needs_cutting
        FROM product_categories
        WHERE id = ANY($1) AND is_active
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;

    let known: std::collections::HashMap<Uuid, (bool, bool)> =
        flags.into_iter().map(|(id, p, c)| (id, (p, c))).collect();

    let mut needs_press = false;
    let mut needs_cutting = false;
    for item in items {
        let Some((press, cutting)) = known.get(&item.category_id) else {
            return Err(AppError::Validation {
                field: "category_id".to_string(),
                message: "Unknown or inactive product category".to_string(),
                message_id: "Kategori produk tidak ditemukan atau nonaktif".to_string(),
            });
        };
        needs_press |= press;
        needs_cutting |= cutting;
    }

    Ok(ProductionRoute::from_composition(needs_press, needs_cutting))
}

async fn insert_items_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    items: &[OrderItemInput],
) -> AppResult<Vec<OrderItem>> {
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let row = sqlx::query_as::<_, OrderItemRow>(
            r#"
            INSERT INTO order_items (order_id, category_id, product_name, quantity, unit_price, line_total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, order_id, category_id, product_name, quantity, unit_price, line_total
            "#,
        )
        .bind(order_id)
        .bind(item.category_id)
        .bind(item.product_name.trim())
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.quantity * item.unit_price)
        .fetch_one(&mut **tx)
        .await?;
        inserted.push(row.into());
    }
    Ok(inserted)
}

/// Lock an order row for update
pub(crate) async fn lock_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<OrderRow> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(order_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

/// Append one row to the order's status history
pub(crate) async fn append_history_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    from_status: Option<ProductionStatus>,
    to_status: ProductionStatus,
    changed_by: Option<Uuid>,
    note: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_status_history (order_id, from_status, to_status, changed_by, note)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(order_id)
    .bind(from_status.map(|s| s.as_str()))
    .bind(to_status.as_str())
    .bind(changed_by)
    .bind(note)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_patch_fields_keep_current_values() {
        let input: UpdateOrderInput = serde_json::from_str("{}").unwrap();
        assert_eq!(input.due_date, None);
        assert_eq!(input.notes, None);

        let kept = patch_field(input.notes, Some("rush job".to_string()));
        assert_eq!(kept.as_deref(), Some("rush job"));
    }

    #[test]
    fn explicit_null_clears_the_field() {
        let input: UpdateOrderInput =
            serde_json::from_str(r#"{"due_date": null, "notes": null}"#).unwrap();
        assert_eq!(input.due_date, Some(None));
        assert_eq!(input.notes, Some(None));

        let cleared = patch_field(input.notes, Some("rush job".to_string()));
        assert_eq!(cleared, None);
    }

    #[test]
    fn provided_value_replaces_the_field() {
        let input: UpdateOrderInput =
            serde_json::from_str(r#"{"due_date": "2026-09-15", "notes": "sablon 2 warna"}"#)
                .unwrap();
        assert_eq!(
            input.due_date,
            Some(NaiveDate::from_ymd_opt(2026, 9, 15))
        );

        let replaced = patch_field(input.notes, Some("rush job".to_string()));
        assert_eq!(replaced.as_deref(), Some("sablon 2 warna"));
    }
}
