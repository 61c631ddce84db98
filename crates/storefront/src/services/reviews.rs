//! Review service.

use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use velostore_core::{OrderId, ProductId};

use crate::db::RepositoryError;
use crate::db::catalog::ProductRepository;
use crate::db::reviews::ReviewRepository;
use crate::models::review::{NewReview, Review};
use crate::models::user::CurrentUser;

/// Maximum review comment length, in characters.
pub const MAX_COMMENT_LENGTH: usize = 500;

/// Review submission failures.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("product id is not a valid identifier")]
    ProductIdInvalid,

    #[error("product not found")]
    ProductNotFound,

    #[error("order id is not a valid identifier")]
    OrderIdInvalid,

    #[error("rating must be an integer between 1 and 5")]
    RatingInvalid,

    #[error("comment exceeds {MAX_COMMENT_LENGTH} characters")]
    CommentTooLong,

    #[error("a review for this product already exists")]
    AlreadyExists,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// List the reviews of a product.
///
/// # Errors
///
/// Returns `ProductIdInvalid` / `ProductNotFound` for a bad product
/// reference, or the repository error.
pub async fn list_reviews(pool: &PgPool, raw_product_id: &str) -> Result<Vec<Review>, ReviewError> {
    let product_id =
        ProductId::parse(raw_product_id).map_err(|_| ReviewError::ProductIdInvalid)?;

    ProductRepository::new(pool)
        .get_by_id(product_id)
        .await?
        .ok_or(ReviewError::ProductNotFound)?;

    Ok(ReviewRepository::new(pool)
        .list_for_product(product_id)
        .await?)
}

/// Submit a review for a product.
///
/// The (user, product) uniqueness is enforced by the database, so two
/// concurrent submissions cannot both succeed.
///
/// # Errors
///
/// Returns the validation variants of [`ReviewError`], or `AlreadyExists`
/// when the caller has already reviewed this product.
#[instrument(skip(pool, caller, body), fields(user_id = %caller.id))]
pub async fn create_review(
    pool: &PgPool,
    caller: &CurrentUser,
    raw_product_id: &str,
    body: Option<&Value>,
) -> Result<Review, ReviewError> {
    let product_id =
        ProductId::parse(raw_product_id).map_err(|_| ReviewError::ProductIdInvalid)?;
    let body = body.unwrap_or(&Value::Null);

    let rating = parse_rating(body.get("rating"))?;
    let comment = parse_comment(body.get("comment"))?;
    let order_id = parse_order_id(body.get("orderId"))?;

    ProductRepository::new(pool)
        .get_by_id(product_id)
        .await?
        .ok_or(ReviewError::ProductNotFound)?;

    ReviewRepository::new(pool)
        .create(NewReview {
            user_id: caller.id,
            product_id,
            order_id,
            rating,
            comment,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => ReviewError::AlreadyExists,
            other => ReviewError::Repository(other),
        })
}

fn parse_rating(value: Option<&Value>) -> Result<i32, ReviewError> {
    value
        .and_then(Value::as_i64)
        .filter(|r| (1..=5).contains(r))
        .and_then(|r| i32::try_from(r).ok())
        .ok_or(ReviewError::RatingInvalid)
}

fn parse_comment(value: Option<&Value>) -> Result<String, ReviewError> {
    let comment = value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_owned();
    if comment.chars().count() > MAX_COMMENT_LENGTH {
        return Err(ReviewError::CommentTooLong);
    }
    Ok(comment)
}

fn parse_order_id(value: Option<&Value>) -> Result<Option<OrderId>, ReviewError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => OrderId::parse(s)
            .map(Some)
            .map_err(|_| ReviewError::OrderIdInvalid),
        Some(_) => Err(ReviewError::OrderIdInvalid),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_rating_bounds() {
        for valid in 1..=5 {
            assert_eq!(parse_rating(Some(&json!(valid))).unwrap(), valid);
        }
        for bad in [json!(0), json!(6), json!(3.5), json!("4"), Value::Null] {
            assert!(matches!(
                parse_rating(Some(&bad)),
                Err(ReviewError::RatingInvalid)
            ));
        }
        assert!(matches!(parse_rating(None), Err(ReviewError::RatingInvalid)));
    }

    #[test]
    fn test_comment_length_limit() {
        assert_eq!(parse_comment(Some(&json!("  solid bike  "))).unwrap(), "solid bike");
        assert_eq!(parse_comment(None).unwrap(), "");

        let long = "x".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(matches!(
            parse_comment(Some(&json!(long))),
            Err(ReviewError::CommentTooLong)
        ));

        let at_limit = "x".repeat(MAX_COMMENT_LENGTH);
        assert!(parse_comment(Some(&json!(at_limit))).is_ok());
    }

    #[test]
    fn test_order_id_optional_but_validated() {
        assert_eq!(parse_order_id(None).unwrap(), None);
        assert_eq!(parse_order_id(Some(&Value::Null)).unwrap(), None);

        let id = OrderId::generate();
        assert_eq!(
            parse_order_id(Some(&json!(id.to_string()))).unwrap(),
            Some(id)
        );

        assert!(matches!(
            parse_order_id(Some(&json!("not-an-id"))),
            Err(ReviewError::OrderIdInvalid)
        ));
        assert!(matches!(
            parse_order_id(Some(&json!(42))),
            Err(ReviewError::OrderIdInvalid)
        ));
    }
}
