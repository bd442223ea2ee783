//! Order and work-order (SPK) models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::production::{ProductionRoute, ProductionStatus};

/// Product categories offered by the print shop
///
/// The composition flags drive the production route: a category that needs
/// neither press nor cutting is "print only".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub needs_press: bool,
    pub needs_cutting: bool,
    pub is_active: bool,
}

/// A customer order identified by its SPK number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Work-order number, format SPK-YYYY-NNNN
    pub spk_number: String,
    pub customer_id: Uuid,
    pub order_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: ProductionStatus,
    pub route: ProductionRoute,
    pub total_amount: Decimal,
    pub down_payment: Decimal,
    pub is_cancelled: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item on an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub category_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// One row of the append-only status history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusHistory {
    pub id: Uuid,
    pub order_id: Uuid,
    pub from_status: Option<ProductionStatus>,
    pub to_status: ProductionStatus,
    pub changed_by: Option<Uuid>,
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Input line item for order creation
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub category_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Input for creating an order
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    pub order_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<OrderItemInput>,
    pub notes: Option<String>,
}

impl CreateOrderInput {
    /// Order total as the sum of quantity × unit price over all items
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.quantity * i.unit_price)
            .sum()
    }
}
