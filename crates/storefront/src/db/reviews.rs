//! Review repository.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use velostore_core::{OrderId, ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::review::{NewReview, Review};

/// Repository for review operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    order_id: Option<Uuid>,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            order_id: row.order_id.map(OrderId::new),
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a review and update the product's denormalized rating, in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the (user, product) pair
    /// already has a review - the unique index makes this safe under
    /// concurrent submissions. Returns `RepositoryError::Database` for other
    /// failures.
    pub async fn create(&self, review: NewReview) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: ReviewRow = sqlx::query_as(
            "INSERT INTO reviews (user_id, product_id, order_id, rating, comment) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, product_id, order_id, rating, comment, created_at",
        )
        .bind(review.user_id.as_uuid())
        .bind(review.product_id.as_uuid())
        .bind(review.order_id.as_ref().map(OrderId::as_uuid))
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("review already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        // Fold the new rating into the denormalized average. The right-hand
        // side reads the pre-update column values.
        sqlx::query(
            "UPDATE products SET \
               rating_avg = ROUND(((COALESCE(rating_avg, 0) * rating_count) + $2) \
                                  / (rating_count + 1), 2), \
               rating_count = rating_count + 1 \
             WHERE id = $1",
        )
        .bind(review.product_id.as_uuid())
        .bind(Decimal::from(review.rating))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Review::from(row))
    }

    /// List the reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            "SELECT id, user_id, product_id, order_id, rating, comment, created_at \
             FROM reviews WHERE product_id = $1 ORDER BY created_at DESC",
        )
        .bind(product_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// The subset of `product_ids` the user has reviewed, in one query.
    ///
    /// Used by the order query service to compute the read-time `reviewed`
    /// flag on order lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reviewed_product_ids(
        &self,
        user_id: UserId,
        product_ids: &[ProductId],
    ) -> Result<HashSet<ProductId>, RepositoryError> {
        if product_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<Uuid> = product_ids.iter().map(|id| id.as_uuid()).collect();

        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT product_id FROM reviews WHERE user_id = $1 AND product_id = ANY($2)",
        )
        .bind(user_id.as_uuid())
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| ProductId::new(id)).collect())
    }
}
