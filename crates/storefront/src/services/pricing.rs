//! Cart pricing engine.
//!
//! Prices a set of (product, variant, quantity) lines against the current
//! catalog. Pure with respect to the caller - the catalog is only read, and
//! identical inputs against unchanged catalog state produce identical
//! results.
//!
//! Validation fails fast on the first violation; resolution batch-fetches
//! all referenced variants and the deduplicated product set in one lookup
//! each before any line-level checks run.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use velostore_core::{ProductId, VariantId};

use crate::db::RepositoryError;
use crate::db::catalog::ProductRepository;
use crate::models::order::Totals;
use crate::models::product::{Product, ProductVariant};
use crate::services::standard_shipping_fee;

/// One requested cart line, parsed and syntactically valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLineInput {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: i64,
}

/// One priced cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedCartLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub name: String,
    pub variant_name: String,
    pub quantity: i64,
    /// Base product price plus the variant's extra price.
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// The authoritative pricing of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartPriceResult {
    pub items: Vec<PricedCartLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Cart pricing failures, in the order they are detected.
#[derive(Debug, Error)]
pub enum CartPricingError {
    #[error("cart items are required")]
    ItemsRequired,

    #[error("cart item is not a well-formed object")]
    ItemInvalid,

    #[error("cart product id is not a valid identifier")]
    ProductIdInvalid,

    #[error("cart variant id is not a valid identifier")]
    VariantIdInvalid,

    #[error("cart quantity must be a positive integer")]
    QuantityInvalid,

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("variant {0} not found")]
    VariantNotFound(VariantId),

    #[error("variant {variant_id} does not belong to product {product_id}")]
    VariantProductMismatch {
        product_id: ProductId,
        variant_id: VariantId,
    },

    #[error("variant {variant_id} has {available} in stock, {requested} requested")]
    OutOfStock {
        variant_id: VariantId,
        available: i32,
        requested: i64,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Price a cart against the current catalog.
///
/// `items` is the raw `items` field of the request body; parsing happens
/// here rather than in the extractor so the engine owns every error code.
///
/// # Errors
///
/// Returns a [`CartPricingError`] describing the first violation found, or
/// the repository error if a catalog read fails.
#[instrument(skip(pool, items))]
pub async fn price_cart(
    pool: &PgPool,
    items: Option<&Value>,
) -> Result<CartPriceResult, CartPricingError> {
    let lines = parse_cart_lines(items)?;
    let repo = ProductRepository::new(pool);

    // Both batch reads complete before line-level validation: the checks
    // below need every referenced record, and two ANY() queries avoid an
    // N+1 pattern on large carts.
    let variant_ids: Vec<VariantId> = lines.iter().map(|l| l.variant_id).collect();
    let variants: HashMap<VariantId, ProductVariant> = repo
        .get_variants_by_ids(&variant_ids)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let product_ids: Vec<ProductId> = {
        let mut seen = HashSet::new();
        lines
            .iter()
            .map(|l| l.product_id)
            .filter(|id| seen.insert(*id))
            .collect()
    };
    let products: HashMap<ProductId, Product> = repo
        .get_by_ids(&product_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    price_lines(&lines, &products, &variants)
}

/// Parse the raw `items` value into validated cart lines.
///
/// Validation order per line: well-formed object, product id, variant id,
/// quantity - failing fast on the first violation across the whole input.
///
/// # Errors
///
/// Returns the input-validation variants of [`CartPricingError`].
pub fn parse_cart_lines(items: Option<&Value>) -> Result<Vec<CartLineInput>, CartPricingError> {
    let Some(Value::Array(raw)) = items else {
        return Err(CartPricingError::ItemsRequired);
    };
    if raw.is_empty() {
        return Err(CartPricingError::ItemsRequired);
    }

    raw.iter().map(parse_cart_line).collect()
}

fn parse_cart_line(value: &Value) -> Result<CartLineInput, CartPricingError> {
    let Value::Object(line) = value else {
        return Err(CartPricingError::ItemInvalid);
    };

    let product_id = line
        .get("productId")
        .and_then(Value::as_str)
        .and_then(|s| ProductId::parse(s).ok())
        .ok_or(CartPricingError::ProductIdInvalid)?;

    let variant_id = line
        .get("variantId")
        .and_then(Value::as_str)
        .and_then(|s| VariantId::parse(s).ok())
        .ok_or(CartPricingError::VariantIdInvalid)?;

    let quantity = line
        .get("quantity")
        .and_then(Value::as_i64)
        .filter(|q| *q >= 1)
        .ok_or(CartPricingError::QuantityInvalid)?;

    Ok(CartLineInput {
        product_id,
        variant_id,
        quantity,
    })
}

/// Price validated lines against pre-fetched catalog records.
///
/// Pure: the only inputs are the lines and the two lookup maps, so repeated
/// calls with the same arguments return identical results.
///
/// # Errors
///
/// Returns the resolution variants of [`CartPricingError`] for the first
/// offending line.
pub fn price_lines(
    lines: &[CartLineInput],
    products: &HashMap<ProductId, Product>,
    variants: &HashMap<VariantId, ProductVariant>,
) -> Result<CartPriceResult, CartPricingError> {
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let product = products
            .get(&line.product_id)
            .ok_or(CartPricingError::ProductNotFound(line.product_id))?;
        let variant = variants
            .get(&line.variant_id)
            .ok_or(CartPricingError::VariantNotFound(line.variant_id))?;

        // A variant priced under a product it does not belong to would be a
        // silent client-side mixup (e.g. stale cache); hard error instead.
        if variant.product_id != line.product_id {
            return Err(CartPricingError::VariantProductMismatch {
                product_id: line.product_id,
                variant_id: line.variant_id,
            });
        }

        if line.quantity > i64::from(variant.stock_quantity) {
            return Err(CartPricingError::OutOfStock {
                variant_id: line.variant_id,
                available: variant.stock_quantity,
                requested: line.quantity,
            });
        }

        let unit_price = product.price + variant.extra_price;
        let line_total = unit_price * Decimal::from(line.quantity);

        items.push(PricedCartLine {
            product_id: line.product_id,
            variant_id: line.variant_id,
            name: product.name.clone(),
            variant_name: variant.variant_name.clone(),
            quantity: line.quantity,
            unit_price,
            line_total,
        });
    }

    let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();
    let shipping = if items.is_empty() {
        Decimal::ZERO
    } else {
        standard_shipping_fee()
    };
    let totals = Totals::compute(subtotal, shipping);

    Ok(CartPriceResult {
        items,
        subtotal: totals.items_total,
        tax: totals.tax,
        shipping: totals.shipping,
        total: totals.grand_total,
    })
}
