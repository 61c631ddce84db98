//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, ApiError>`. Each domain error maps
//! to a stable string code and an HTTP status; error responses are always
//! `{"error": "<CODE>", ...context}` where context carries the offending
//! identifier or available/requested quantities when the error class calls
//! for it. Unexpected failures surface as an operation-scoped generic code
//! after being logged and captured to Sentry - internal detail never reaches
//! the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::orders::OrderQueryError;
use crate::services::pricing::CartPricingError;
use crate::services::reviews::ReviewError;

/// Application-level error type for the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Cart pricing failed.
    #[error("cart pricing error: {0}")]
    Cart(#[from] CartPricingError),

    /// Order assembly failed.
    #[error("checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order lookup failed.
    #[error("order query error: {0}")]
    OrderQuery(#[from] OrderQueryError),

    /// Authentication or profile operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Review operation failed.
    #[error("review error: {0}")]
    Review(#[from] ReviewError),

    /// The route requires an authenticated caller.
    #[error("authentication required")]
    AuthRequired,

    /// Malformed product id in a route path.
    #[error("invalid product id")]
    InvalidProductId,

    /// Product referenced by a route path does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// Database operation failed outside a service.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),
}

impl ApiError {
    /// The stable wire code and HTTP status for this error.
    #[must_use]
    pub fn code_and_status(&self) -> (&'static str, StatusCode) {
        use StatusCode as S;

        match self {
            Self::Cart(err) => match err {
                CartPricingError::ItemsRequired => ("CART_ITEMS_REQUIRED", S::BAD_REQUEST),
                CartPricingError::ItemInvalid => ("CART_ITEM_INVALID", S::BAD_REQUEST),
                CartPricingError::ProductIdInvalid => ("CART_PRODUCT_ID_INVALID", S::BAD_REQUEST),
                CartPricingError::VariantIdInvalid => ("CART_VARIANT_ID_INVALID", S::BAD_REQUEST),
                CartPricingError::QuantityInvalid => ("CART_QUANTITY_INVALID", S::BAD_REQUEST),
                CartPricingError::ProductNotFound(_) => ("CART_PRODUCT_NOT_FOUND", S::NOT_FOUND),
                CartPricingError::VariantNotFound(_) => ("CART_VARIANT_NOT_FOUND", S::NOT_FOUND),
                CartPricingError::VariantProductMismatch { .. } => {
                    ("CART_VARIANT_PRODUCT_MISMATCH", S::BAD_REQUEST)
                }
                // Conflict semantics: stock is a concurrency-sensitive
                // condition, not a client input error.
                CartPricingError::OutOfStock { .. } => ("OUT_OF_STOCK", S::CONFLICT),
                CartPricingError::Repository(_) => {
                    ("CART_PRICE_ERROR", S::INTERNAL_SERVER_ERROR)
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::ItemsRequired => ("ITEMS_REQUIRED", S::BAD_REQUEST),
                CheckoutError::PaymentAndDeliveryRequired => {
                    ("PAYMENT_AND_DELIVERY_REQUIRED", S::BAD_REQUEST)
                }
                CheckoutError::InvalidDeliveryMethod => ("INVALID_DELIVERY_METHOD", S::BAD_REQUEST),
                CheckoutError::InvalidPaymentMethod => ("INVALID_PAYMENT_METHOD", S::BAD_REQUEST),
                CheckoutError::InvalidProductId => ("INVALID_PRODUCT_ID", S::BAD_REQUEST),
                CheckoutError::ProductNotFound => ("PRODUCT_NOT_FOUND", S::NOT_FOUND),
                CheckoutError::InvalidQty => ("INVALID_QTY", S::BAD_REQUEST),
                CheckoutError::ShippingAddressRequired => {
                    ("SHIPPING_ADDRESS_REQUIRED", S::BAD_REQUEST)
                }
                CheckoutError::ProfileAddressMissing => ("PROFILE_ADDRESS_MISSING", S::BAD_REQUEST),
                CheckoutError::UserNotFound => ("AUTH_USER_NOT_FOUND", S::UNAUTHORIZED),
                CheckoutError::Repository(_) => ("CREATE_ORDER_FAILED", S::INTERNAL_SERVER_ERROR),
            },
            Self::OrderQuery(err) => match err {
                OrderQueryError::InvalidOrderId => ("INVALID_ORDER_ID", S::BAD_REQUEST),
                OrderQueryError::NotFound => ("ORDER_NOT_FOUND", S::NOT_FOUND),
                OrderQueryError::Forbidden => ("FORBIDDEN_ORDER_ACCESS", S::FORBIDDEN),
                OrderQueryError::Repository(_) => {
                    ("ORDERS_FETCH_FAILED", S::INTERNAL_SERVER_ERROR)
                }
            },
            Self::Auth(err) => match err {
                AuthError::RegisterMissingFields => ("REGISTER_MISSING_FIELDS", S::BAD_REQUEST),
                AuthError::RegisterEmailInvalid(_) => ("REGISTER_EMAIL_INVALID", S::BAD_REQUEST),
                AuthError::RegisterEmailExists => ("REGISTER_EMAIL_EXISTS", S::CONFLICT),
                AuthError::LoginMissingFields => ("LOGIN_MISSING_FIELDS", S::BAD_REQUEST),
                AuthError::InvalidCredentials => ("LOGIN_INVALID_CREDENTIALS", S::UNAUTHORIZED),
                AuthError::UserNotFound => ("USER_NOT_FOUND", S::NOT_FOUND),
                AuthError::ProfileNoFields => ("PROFILE_NO_FIELDS", S::BAD_REQUEST),
                AuthError::ProfileEmailInvalid(_) => ("PROFILE_EMAIL_INVALID", S::BAD_REQUEST),
                AuthError::ProfileEmailExists => ("PROFILE_EMAIL_EXISTS", S::CONFLICT),
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    ("AUTH_FAILED", S::INTERNAL_SERVER_ERROR)
                }
            },
            Self::Review(err) => match err {
                ReviewError::ProductIdInvalid => ("INVALID_PRODUCT_ID", S::BAD_REQUEST),
                ReviewError::ProductNotFound => ("PRODUCT_NOT_FOUND", S::NOT_FOUND),
                ReviewError::OrderIdInvalid => ("INVALID_ORDER_ID", S::BAD_REQUEST),
                ReviewError::RatingInvalid => ("REVIEW_RATING_INVALID", S::BAD_REQUEST),
                ReviewError::CommentTooLong => ("REVIEW_COMMENT_TOO_LONG", S::BAD_REQUEST),
                ReviewError::AlreadyExists => ("REVIEW_ALREADY_EXISTS", S::CONFLICT),
                ReviewError::Repository(_) => ("REVIEW_CREATE_FAILED", S::INTERNAL_SERVER_ERROR),
            },
            Self::AuthRequired => ("AUTH_REQUIRED", S::UNAUTHORIZED),
            Self::InvalidProductId => ("INVALID_PRODUCT_ID", S::BAD_REQUEST),
            Self::ProductNotFound => ("PRODUCT_NOT_FOUND", S::NOT_FOUND),
            Self::Database(_) => ("INTERNAL_ERROR", S::INTERNAL_SERVER_ERROR),
        }
    }

    /// Diagnostic context merged into the error body.
    fn context(&self) -> Map<String, Value> {
        let mut context = Map::new();
        match self {
            Self::Cart(CartPricingError::ProductNotFound(id)) => {
                context.insert("productId".to_owned(), json!(id));
            }
            Self::Cart(CartPricingError::VariantNotFound(id)) => {
                context.insert("variantId".to_owned(), json!(id));
            }
            Self::Cart(CartPricingError::OutOfStock {
                variant_id,
                available,
                requested,
            }) => {
                context.insert("variantId".to_owned(), json!(variant_id));
                context.insert("available".to_owned(), json!(available));
                context.insert("requested".to_owned(), json!(requested));
            }
            _ => {}
        }
        context
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, status) = self.code_and_status();

        // Capture unexpected failures before responding; everything else is
        // a deliberate client-facing outcome.
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                code,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let mut body = Map::new();
        body.insert("error".to_owned(), json!(code));
        body.extend(self.context());

        (status, Json(Value::Object(body))).into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use velostore_core::{ProductId, VariantId};

    use super::*;

    #[test]
    fn test_cart_codes_and_statuses() {
        let cases: Vec<(ApiError, &str, StatusCode)> = vec![
            (
                CartPricingError::ItemsRequired.into(),
                "CART_ITEMS_REQUIRED",
                StatusCode::BAD_REQUEST,
            ),
            (
                CartPricingError::ProductNotFound(ProductId::generate()).into(),
                "CART_PRODUCT_NOT_FOUND",
                StatusCode::NOT_FOUND,
            ),
            (
                CartPricingError::OutOfStock {
                    variant_id: VariantId::generate(),
                    available: 2,
                    requested: 3,
                }
                .into(),
                "OUT_OF_STOCK",
                StatusCode::CONFLICT,
            ),
        ];

        for (err, code, status) in cases {
            assert_eq!(err.code_and_status(), (code, status));
        }
    }

    #[test]
    fn test_checkout_codes_and_statuses() {
        let cases: Vec<(ApiError, &str, StatusCode)> = vec![
            (
                CheckoutError::ItemsRequired.into(),
                "ITEMS_REQUIRED",
                StatusCode::BAD_REQUEST,
            ),
            (
                CheckoutError::ShippingAddressRequired.into(),
                "SHIPPING_ADDRESS_REQUIRED",
                StatusCode::BAD_REQUEST,
            ),
            (
                CheckoutError::ProfileAddressMissing.into(),
                "PROFILE_ADDRESS_MISSING",
                StatusCode::BAD_REQUEST,
            ),
            (
                CheckoutError::InvalidDeliveryMethod.into(),
                "INVALID_DELIVERY_METHOD",
                StatusCode::BAD_REQUEST,
            ),
            (
                CheckoutError::UserNotFound.into(),
                "AUTH_USER_NOT_FOUND",
                StatusCode::UNAUTHORIZED,
            ),
        ];

        for (err, code, status) in cases {
            assert_eq!(err.code_and_status(), (code, status));
        }
    }

    #[test]
    fn test_order_query_codes_and_statuses() {
        assert_eq!(
            ApiError::from(OrderQueryError::Forbidden).code_and_status(),
            ("FORBIDDEN_ORDER_ACCESS", StatusCode::FORBIDDEN)
        );
        assert_eq!(
            ApiError::from(OrderQueryError::NotFound).code_and_status(),
            ("ORDER_NOT_FOUND", StatusCode::NOT_FOUND)
        );
        assert_eq!(
            ApiError::AuthRequired.code_and_status(),
            ("AUTH_REQUIRED", StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn test_out_of_stock_context_carries_quantities() {
        let vid = VariantId::generate();
        let err = ApiError::from(CartPricingError::OutOfStock {
            variant_id: vid,
            available: 2,
            requested: 3,
        });

        let context = err.context();
        assert_eq!(context.get("available"), Some(&json!(2)));
        assert_eq!(context.get("requested"), Some(&json!(3)));
        assert_eq!(context.get("variantId"), Some(&json!(vid)));
    }

    #[test]
    fn test_not_found_context_carries_offending_id() {
        let pid = ProductId::generate();
        let err = ApiError::from(CartPricingError::ProductNotFound(pid));
        assert_eq!(err.context().get("productId"), Some(&json!(pid)));
    }
}
