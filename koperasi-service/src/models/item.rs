//! Inventory item (barang) model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Item {
    pub item_id: Uuid,
    pub name: String,
    pub stock: i32,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
    pub active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Item {
    /// Per-unit profit snapshot used by transaction lines.
    pub fn unit_profit(&self) -> Decimal {
        self.sale_price - self.cost_price
    }
}

/// Input for creating an item.
#[derive(Debug, Clone)]
pub struct CreateItem {
    pub name: String,
    pub stock: i32,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
}

/// Input for updating an item. Price edits never rewrite the snapshots
/// already taken on historical transaction lines.
#[derive(Debug, Clone, Default)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub stock: Option<i32>,
    pub cost_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}
