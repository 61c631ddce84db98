//! Review domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use velostore_core::{OrderId, ProductId, ReviewId, UserId};

/// A product review.
///
/// At most one review exists per (user, product) pair; the database enforces
/// this with a unique index so concurrent submissions cannot create
/// duplicates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub order_id: Option<OrderId>,
    /// Integer rating, 1 through 5.
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub order_id: Option<OrderId>,
    pub rating: i32,
    pub comment: String,
}
