//! Material inventory models (fabric, paper, ink stock)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw material kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Fabric,
    Paper,
    Ink,
    Other,
}

impl MaterialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::Fabric => "fabric",
            MaterialKind::Paper => "paper",
            MaterialKind::Ink => "ink",
            MaterialKind::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fabric" => Some(MaterialKind::Fabric),
            "paper" => Some(MaterialKind::Paper),
            "ink" => Some(MaterialKind::Ink),
            "other" => Some(MaterialKind::Other),
            _ => None,
        }
    }
}

/// Stock movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    In,
    Out,
}

impl MovementDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementDirection::In => "in",
            MovementDirection::Out => "out",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementDirection::In),
            "out" => Some(MovementDirection::Out),
            _ => None,
        }
    }
}

/// Why stock moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Purchase,
    ProductionUse,
    Adjustment,
    Return,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Purchase => "purchase",
            MovementKind::ProductionUse => "production_use",
            MovementKind::Adjustment => "adjustment",
            MovementKind::Return => "return",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(MovementKind::Purchase),
            "production_use" => Some(MovementKind::ProductionUse),
            "adjustment" => Some(MovementKind::Adjustment),
            "return" => Some(MovementKind::Return),
            _ => None,
        }
    }
}

/// A stocked material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub kind: MaterialKind,
    /// Unit of measure, e.g. "m", "sheet", "ml"
    pub unit: String,
    pub minimum_stock: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stock movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub item_id: Uuid,
    pub direction: MovementDirection,
    pub kind: MovementKind,
    pub quantity: Decimal,
    /// Order or bill the movement refers to
    pub reference_id: Option<Uuid>,
    pub note: Option<String>,
    pub moved_by: Option<Uuid>,
    pub movement_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Current balance of one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBalance {
    pub item_id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub balance: Decimal,
    pub minimum_stock: Decimal,
    pub below_minimum: bool,
}
