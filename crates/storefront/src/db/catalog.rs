//! Catalog repository for products and variants.
//!
//! The pricing engines depend on the two batch lookups here completing
//! before any line-level validation starts; both are single `ANY($1)`
//! queries so a cart of N lines costs two round trips, not 2N.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use velostore_core::{ProductId, ProductType, VariantId};

use super::RepositoryError;
use crate::models::product::{Product, ProductVariant};

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    product_type: String,
    in_stock: bool,
    short_description: Option<String>,
    long_description: Option<String>,
    brand: Option<String>,
    image_url: Option<String>,
    rating_avg: Option<Decimal>,
    rating_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let product_type = ProductType::parse(&row.product_type).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "unknown product type in database: {}",
                row.product_type
            ))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            product_type,
            in_stock: row.in_stock,
            short_description: row.short_description,
            long_description: row.long_description,
            brand: row.brand,
            image_url: row.image_url,
            rating_avg: row.rating_avg,
            rating_count: row.rating_count,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VariantRow {
    id: Uuid,
    product_id: Uuid,
    variant_name: String,
    sku: Option<String>,
    stock_quantity: i32,
    extra_price: Decimal,
}

impl From<VariantRow> for ProductVariant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: VariantId::new(row.id),
            product_id: ProductId::new(row.product_id),
            variant_name: row.variant_name,
            sku: row.sku,
            stock_quantity: row.stock_quantity,
            extra_price: row.extra_price,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, price, product_type, in_stock, short_description, \
     long_description, brand, image_url, rating_avg, rating_count, created_at";

impl<'a> ProductRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, optionally filtered by type, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        product_type: Option<ProductType>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = match product_type {
            Some(pt) => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_type = $1 \
                     ORDER BY created_at DESC"
                ))
                .bind(pt.as_str())
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Batch-fetch products by id set in one query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// List the variants of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        let rows: Vec<VariantRow> = sqlx::query_as(
            "SELECT id, product_id, variant_name, sku, stock_quantity, extra_price \
             FROM product_variants WHERE product_id = $1 ORDER BY variant_name ASC",
        )
        .bind(product_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductVariant::from).collect())
    }

    /// Batch-fetch variants by id set in one query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_variants_by_ids(
        &self,
        ids: &[VariantId],
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();

        let rows: Vec<VariantRow> = sqlx::query_as(
            "SELECT id, product_id, variant_name, sku, stock_quantity, extra_price \
             FROM product_variants WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductVariant::from).collect())
    }
}
