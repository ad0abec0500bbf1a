//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: Option<String>,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    /// Moving-average cost, updated by inbound stock movements
    pub avg_cost: Decimal,
    pub min_stock: Decimal,
    pub is_active: bool,
    pub has_variants: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A variant of a product (color, storage size, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub avg_cost: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
