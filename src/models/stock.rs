//! Warehouse stock items and per-center stock balances.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Item held in the franchisor's central warehouse.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockItem {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Quantity of a stock item held by one center.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CenterStock {
    pub id: Uuid,
    pub center_id: Uuid,
    pub stock_item_id: Uuid,
    pub quantity: i32,
}
