//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use velostore_core::{ProductId, ProductType, VariantId};

/// A product in the catalog.
///
/// Orders snapshot `name` and `price` at creation time; edits to a product
/// never change historical orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Authoritative base unit price.
    pub price: Decimal,
    pub product_type: ProductType,
    pub in_stock: bool,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    /// Denormalized review average, updated when a review is created.
    pub rating_avg: Option<Decimal>,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
}

/// A purchasable configuration of a product (e.g. a frame size).
///
/// Carries its own stock and a price delta added to the product's base price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub variant_name: String,
    pub sku: Option<String>,
    pub stock_quantity: i32,
    pub extra_price: Decimal,
}
