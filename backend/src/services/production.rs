//! Production workflow service
//!
//! Drives orders along the shared state machine. Every transition happens
//! inside a transaction that locks the order, checks the move against the
//! route, updates the status, and appends to the status history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::inventory::consume_stock_tx;
use crate::services::order::{append_history_tx, lock_order_tx, OrderRow, ORDER_COLUMNS};
use shared::models::{
    can_advance, Order, OrderStatusHistory, ProductionRoute, ProductionStatus,
};

/// Production service
#[derive(Clone)]
pub struct ProductionService {
    db: PgPool,
}

/// Material consumed when printing starts
#[derive(Debug, Deserialize)]
pub struct MaterialUseInput {
    pub item_id: Uuid,
    pub quantity: Decimal,
}

/// Input for starting the print step
#[derive(Debug, Deserialize)]
pub struct StartPrintInput {
    /// Materials drawn from stock for this order
    #[serde(default)]
    pub materials: Vec<MaterialUseInput>,
    pub note: Option<String>,
}

/// Input for the handover step
#[derive(Debug, Deserialize)]
pub struct DeliverInput {
    pub recipient: String,
    pub note: Option<String>,
}

/// Shop-floor queue grouped by current status
#[derive(Debug, Serialize)]
pub struct ProductionQueue {
    pub ready_for_prod: Vec<Order>,
    pub print: Vec<Order>,
    pub print_done: Vec<Order>,
    pub press: Vec<Order>,
    pub cutting: Vec<Order>,
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    order_id: Uuid,
    from_status: Option<String>,
    to_status: String,
    changed_by: Option<Uuid>,
    note: Option<String>,
    changed_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for OrderStatusHistory {
    type Error = AppError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let from_status = match &row.from_status {
            Some(s) => Some(ProductionStatus::from_str(s).ok_or_else(|| {
                AppError::Internal(format!("Unknown status in history: {}", s))
            })?),
            None => None,
        };
        let to_status = ProductionStatus::from_str(&row.to_status).ok_or_else(|| {
            AppError::Internal(format!("Unknown status in history: {}", row.to_status))
        })?;
        Ok(OrderStatusHistory {
            id: row.id,
            order_id: row.order_id,
            from_status,
            to_status,
            changed_by: row.changed_by,
            note: row.note,
            changed_at: row.changed_at,
        })
    }
}

impl ProductionService {
    /// Create a new ProductionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Draft → ReadyForProd; requires at least one item
    pub async fn mark_ready(&self, order_id: Uuid, actor: Uuid) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;
        let current = lock_order_tx(&mut tx, order_id).await?;

        let item_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;
        if item_count == 0 {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "Order has no items and cannot enter production".to_string(),
                message_id: "Pesanan belum memiliki barang".to_string(),
            });
        }

        let order =
            advance_tx(&mut tx, current, ProductionStatus::ReadyForProd, actor, None).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// ReadyForProd → Print, consuming listed materials from stock
    pub async fn start_print(
        &self,
        order_id: Uuid,
        actor: Uuid,
        input: StartPrintInput,
    ) -> AppResult<Order> {
        for material in &input.materials {
            if material.quantity <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: "Material quantity must be positive".to_string(),
                    message_id: "Jumlah bahan harus lebih dari nol".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;
        let current = lock_order_tx(&mut tx, order_id).await?;

        for material in &input.materials {
            consume_stock_tx(&mut tx, material.item_id, material.quantity, order_id, actor)
                .await?;
        }

        let order = advance_tx(
            &mut tx,
            current,
            ProductionStatus::Print,
            actor,
            input.note.as_deref(),
        )
        .await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Print → PrintDone
    pub async fn finish_print(&self, order_id: Uuid, actor: Uuid) -> AppResult<Order> {
        self.simple_step(order_id, actor, ProductionStatus::PrintDone).await
    }

    /// PrintDone → Press (press routes only)
    pub async fn start_press(&self, order_id: Uuid, actor: Uuid) -> AppResult<Order> {
        self.simple_step(order_id, actor, ProductionStatus::Press).await
    }

    /// Press → Cutting on combined routes, otherwise Press → Completed
    pub async fn finish_press(&self, order_id: Uuid, actor: Uuid) -> AppResult<Order> {
        self.advance_from(order_id, actor, ProductionStatus::Press).await
    }

    /// PrintDone → Cutting (cutting routes only)
    pub async fn start_cutting(&self, order_id: Uuid, actor: Uuid) -> AppResult<Order> {
        self.simple_step(order_id, actor, ProductionStatus::Cutting).await
    }

    /// Cutting → Completed
    pub async fn finish_cutting(&self, order_id: Uuid, actor: Uuid) -> AppResult<Order> {
        self.advance_from(order_id, actor, ProductionStatus::Cutting).await
    }

    /// PrintDone → Completed on print-only routes
    pub async fn complete(&self, order_id: Uuid, actor: Uuid) -> AppResult<Order> {
        self.simple_step(order_id, actor, ProductionStatus::Completed).await
    }

    /// Completed → Delivered, recording the handover
    pub async fn deliver(
        &self,
        order_id: Uuid,
        actor: Uuid,
        input: DeliverInput,
    ) -> AppResult<Order> {
        if input.recipient.trim().is_empty() {
            return Err(AppError::Validation {
                field: "recipient".to_string(),
                message: "Recipient name is required".to_string(),
                message_id: "Nama penerima wajib diisi".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let current = lock_order_tx(&mut tx, order_id).await?;
        let note = match &input.note {
            Some(n) => format!("Handed over to {}: {}", input.recipient.trim(), n),
            None => format!("Handed over to {}", input.recipient.trim()),
        };
        let order = advance_tx(
            &mut tx,
            current,
            ProductionStatus::Delivered,
            actor,
            Some(&note),
        )
        .await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Status history for one order, oldest first
    pub async fn get_history(&self, order_id: Uuid) -> AppResult<Vec<OrderStatusHistory>> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_one(&self.db)
            .await?;
        if exists == 0 {
            return Err(AppError::NotFound("Order".to_string()));
        }

        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, order_id, from_status, to_status, changed_by, note, changed_at
            FROM order_status_history
            WHERE order_id = $1
            ORDER BY changed_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Shop-floor queues for all in-flight orders
    pub async fn production_queue(&self) -> AppResult<ProductionQueue> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE status IN ('ready_for_prod', 'print', 'print_done', 'press', 'cutting')
              AND NOT is_cancelled
            ORDER BY due_date NULLS LAST, order_date
            "#
        ))
        .fetch_all(&self.db)
        .await?;

        let mut queue = ProductionQueue {
            ready_for_prod: Vec::new(),
            print: Vec::new(),
            print_done: Vec::new(),
            press: Vec::new(),
            cutting: Vec::new(),
        };
        for row in rows {
            let order: Order = row.try_into()?;
            match order.status {
                ProductionStatus::ReadyForProd => queue.ready_for_prod.push(order),
                ProductionStatus::Print => queue.print.push(order),
                ProductionStatus::PrintDone => queue.print_done.push(order),
                ProductionStatus::Press => queue.press.push(order),
                ProductionStatus::Cutting => queue.cutting.push(order),
                _ => {}
            }
        }
        Ok(queue)
    }

    /// One fixed-target step
    async fn simple_step(
        &self,
        order_id: Uuid,
        actor: Uuid,
        to: ProductionStatus,
    ) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;
        let current = lock_order_tx(&mut tx, order_id).await?;
        let order = advance_tx(&mut tx, current, to, actor, None).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Step whose target depends on the route (finish_press, finish_cutting)
    async fn advance_from(
        &self,
        order_id: Uuid,
        actor: Uuid,
        expected_from: ProductionStatus,
    ) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;
        let current = lock_order_tx(&mut tx, order_id).await?;

        let status = parse_status(&current)?;
        let route = parse_route(&current)?;
        if status != expected_from {
            return Err(AppError::InvalidStateTransition(format!(
                "Order {} is {}, expected {}",
                current.spk_number,
                status.as_str(),
                expected_from.as_str()
            )));
        }
        let to = status.next(route).ok_or_else(|| {
            AppError::InvalidStateTransition(format!(
                "Order {} has no next step after {}",
                current.spk_number,
                status.as_str()
            ))
        })?;

        let order = advance_tx(&mut tx, current, to, actor, None).await?;
        tx.commit().await?;
        Ok(order)
    }
}

fn parse_status(row: &OrderRow) -> AppResult<ProductionStatus> {
    ProductionStatus::from_str(&row.status)
        .ok_or_else(|| AppError::Internal(format!("Unknown order status: {}", row.status)))
}

fn parse_route(row: &OrderRow) -> AppResult<ProductionRoute> {
    ProductionRoute::from_str(&row.route)
        .ok_or_else(|| AppError::Internal(format!("Unknown order route: {}", row.route)))
}

/// Validate and execute one transition on a locked order row
async fn advance_tx(
    tx: &mut Transaction<'_, Postgres>,
    current: OrderRow,
    to: ProductionStatus,
    actor: Uuid,
    note: Option<&str>,
) -> AppResult<Order> {
    if current.is_cancelled {
        return Err(AppError::InvalidStateTransition(format!(
            "Order {} is cancelled",
            current.spk_number
        )));
    }
    let from = parse_status(&current)?;
    let route = parse_route(&current)?;

    if !can_advance(from, to, route) {
        return Err(AppError::InvalidStateTransition(format!(
            "Order {} cannot move from {} to {} on route {}",
            current.spk_number,
            from.as_str(),
            to.as_str(),
            route.as_str()
        )));
    }

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET status = $1 WHERE id = $2 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(to.as_str())
    .bind(current.id)
    .fetch_one(&mut **tx)
    .await?;

    append_history_tx(tx, current.id, Some(from), to, Some(actor), note).await?;
    row.try_into()
}
