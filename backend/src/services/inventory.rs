//! Inventory service for material stock (fabric, paper, ink)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{
    InventoryItem, MaterialKind, MovementDirection, MovementKind, StockBalance, StockMovement,
};

/// Inventory service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    sku: String,
    name: String,
    kind: String,
    unit: String,
    minimum_stock: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for InventoryItem {
    type Error = AppError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let kind = MaterialKind::from_str(&row.kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown material kind: {}", row.kind)))?;
        Ok(InventoryItem {
            id: row.id,
            sku: row.sku,
            name: row.name,
            kind,
            unit: row.unit,
            minimum_stock: row.minimum_stock,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: Uuid,
    item_id: Uuid,
    direction: String,
    kind: String,
    quantity: Decimal,
    reference_id: Option<Uuid>,
    note: Option<String>,
    moved_by: Option<Uuid>,
    movement_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let direction = MovementDirection::from_str(&row.direction).ok_or_else(|| {
            AppError::Internal(format!("Unknown movement direction: {}", row.direction))
        })?;
        let kind = MovementKind::from_str(&row.kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown movement kind: {}", row.kind)))?;
        Ok(StockMovement {
            id: row.id,
            item_id: row.item_id,
            direction,
            kind,
            quantity: row.quantity,
            reference_id: row.reference_id,
            note: row.note,
            moved_by: row.moved_by,
            movement_date: row.movement_date,
            created_at: row.created_at,
        })
    }
}

/// Input for creating an inventory item
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub sku: String,
    pub name: String,
    pub kind: MaterialKind,
    pub unit: String,
    pub minimum_stock: Decimal,
}

/// Input for updating an inventory item
#[derive(Debug, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub minimum_stock: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Input for recording a stock movement
#[derive(Debug, Deserialize)]
pub struct RecordMovementInput {
    pub item_id: Uuid,
    pub direction: MovementDirection,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub reference_id: Option<Uuid>,
    pub note: Option<String>,
    pub movement_date: Option<NaiveDate>,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an inventory item
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<InventoryItem> {
        if input.sku.trim().is_empty() || input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "sku".to_string(),
                message: "SKU and name are required".to_string(),
                message_id: "SKU dan nama wajib diisi".to_string(),
            });
        }
        if input.minimum_stock < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "minimum_stock".to_string(),
                message: "Minimum stock cannot be negative".to_string(),
                message_id: "Stok minimum tidak boleh negatif".to_string(),
            });
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inventory_items WHERE sku = $1",
        )
        .bind(input.sku.trim())
        .fetch_one(&self.db)
        .await?;
        if existing > 0 {
            return Err(AppError::DuplicateEntry("sku".to_string()));
        }

        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO inventory_items (sku, name, kind, unit, minimum_stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sku, name, kind, unit, minimum_stock, is_active, created_at, updated_at
            "#,
        )
        .bind(input.sku.trim())
        .bind(input.name.trim())
        .bind(input.kind.as_str())
        .bind(input.unit.trim())
        .bind(input.minimum_stock)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// Get one item
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<InventoryItem> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, sku, name, kind, unit, minimum_stock, is_active, created_at, updated_at
            FROM inventory_items
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        row.try_into()
    }

    /// List items ordered by SKU
    pub async fn list_items(&self, include_inactive: bool) -> AppResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, sku, name, kind, unit, minimum_stock, is_active, created_at, updated_at
            FROM inventory_items
            WHERE is_active OR $1
            ORDER BY sku
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Update item master data
    pub async fn update_item(
        &self,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> AppResult<InventoryItem> {
        if let Some(min) = input.minimum_stock {
            if min < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "minimum_stock".to_string(),
                    message: "Minimum stock cannot be negative".to_string(),
                    message_id: "Stok minimum tidak boleh negatif".to_string(),
                });
            }
        }

        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            UPDATE inventory_items
            SET name = COALESCE($1, name),
                minimum_stock = COALESCE($2, minimum_stock),
                is_active = COALESCE($3, is_active)
            WHERE id = $4
            RETURNING id, sku, name, kind, unit, minimum_stock, is_active, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(input.minimum_stock)
        .bind(input.is_active)
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        row.try_into()
    }

    /// Record a stock movement
    ///
    /// Outgoing movements re-check the balance inside the transaction so
    /// stock can never go negative.
    pub async fn record_movement(
        &self,
        actor: Uuid,
        input: RecordMovementInput,
    ) -> AppResult<StockMovement> {
        if input.quantity <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity must be positive".to_string(),
                message_id: "Jumlah harus lebih dari nol".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        lock_item_tx(&mut tx, input.item_id).await?;

        if input.direction == MovementDirection::Out {
            let balance = balance_tx(&mut tx, input.item_id).await?;
            if balance < input.quantity {
                return Err(AppError::InsufficientStock(format!(
                    "Requested {} but only {} in stock",
                    input.quantity, balance
                )));
            }
        }

        let row = sqlx::query_as::<_, MovementRow>(
            r#"
            INSERT INTO stock_movements
                (item_id, direction, kind, quantity, reference_id, note, moved_by, movement_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, CURRENT_DATE))
            RETURNING id, item_id, direction, kind, quantity, reference_id, note, moved_by,
                      movement_date, created_at
            "#,
        )
        .bind(input.item_id)
        .bind(input.direction.as_str())
        .bind(input.kind.as_str())
        .bind(input.quantity)
        .bind(input.reference_id)
        .bind(&input.note)
        .bind(actor)
        .bind(input.movement_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Movements for one item, newest first
    pub async fn list_movements(&self, item_id: Uuid) -> AppResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, item_id, direction, kind, quantity, reference_id, note, moved_by,
                   movement_date, created_at
            FROM stock_movements
            WHERE item_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Current balance of one item
    pub async fn get_balance(&self, item_id: Uuid) -> AppResult<StockBalance> {
        let row = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT i.id AS item_id, i.sku, i.name, i.unit, i.minimum_stock,
                   COALESCE(SUM(CASE WHEN m.direction = 'in' THEN m.quantity
                                     ELSE -m.quantity END), 0) AS balance
            FROM inventory_items i
            LEFT JOIN stock_movements m ON m.item_id = i.id
            WHERE i.id = $1
            GROUP BY i.id, i.sku, i.name, i.unit, i.minimum_stock
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        Ok(row.into())
    }

    /// Items whose balance has fallen below their minimum
    pub async fn low_stock(&self) -> AppResult<Vec<StockBalance>> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT i.id AS item_id, i.sku, i.name, i.unit, i.minimum_stock,
                   COALESCE(SUM(CASE WHEN m.direction = 'in' THEN m.quantity
                                     ELSE -m.quantity END), 0) AS balance
            FROM inventory_items i
            LEFT JOIN stock_movements m ON m.item_id = i.id
            WHERE i.is_active
            GROUP BY i.id, i.sku, i.name, i.unit, i.minimum_stock
            HAVING COALESCE(SUM(CASE WHEN m.direction = 'in' THEN m.quantity
                                     ELSE -m.quantity END), 0) < i.minimum_stock
            ORDER BY i.sku
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BalanceRow {
    item_id: Uuid,
    sku: String,
    name: String,
    unit: String,
    minimum_stock: Decimal,
    balance: Decimal,
}

impl From<BalanceRow> for StockBalance {
    fn from(row: BalanceRow) -> Self {
        StockBalance {
            item_id: row.item_id,
            sku: row.sku,
            name: row.name,
            unit: row.unit,
            balance: row.balance,
            minimum_stock: row.minimum_stock,
            below_minimum: row.balance < row.minimum_stock,
        }
    }
}

async fn lock_item_tx(tx: &mut Transaction<'_, Postgres>, item_id: Uuid) -> AppResult<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT sku FROM inventory_items WHERE id = $1 AND is_active FOR UPDATE",
    )
    .bind(item_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))
}

async fn balance_tx(tx: &mut Transaction<'_, Postgres>, item_id: Uuid) -> AppResult<Decimal> {
    let balance = sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT COALESCE(SUM(CASE WHEN direction = 'in' THEN quantity ELSE -quantity END), 0)
        FROM stock_movements
        WHERE item_id = $1
        "#,
    )
    .bind(item_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(balance)
}

/// Draw stock for an order inside an existing transaction
///
/// Called from the production service when printing starts; locks the item
/// and enforces the non-negative balance rule.
pub async fn consume_stock_tx(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
    quantity: Decimal,
    order_id: Uuid,
    actor: Uuid,
) -> AppResult<()> {
    let sku = lock_item_tx(tx, item_id).await?;
    let balance = balance_tx(tx, item_id).await?;
    if balance < quantity {
        return Err(AppError::InsufficientStock(format!(
            "Item {} has {} in stock, production needs {}",
            sku, balance, quantity
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO stock_movements
            (item_id, direction, kind, quantity, reference_id, moved_by, movement_date)
        VALUES ($1, 'out', 'production_use', $2, $3, $4, CURRENT_DATE)
        "#,
    )
    .bind(item_id)
    .bind(quantity)
    .bind(order_id)
    .bind(actor)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
