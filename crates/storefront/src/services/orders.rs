//! Order query service.
//!
//! Serves a user's order history with a read-time `reviewed` flag per line
//! item, and single-order lookup with ownership checks. The reviewed flag
//! is computed by cross-referencing the review store on every read - review
//! state can change after order placement, so it is never stored on the
//! order.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use velostore_core::{OrderId, OrderStatus, ProductId};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::db::reviews::ReviewRepository;
use crate::models::order::Order;
use crate::models::user::CurrentUser;

/// One line of an order summary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryLine {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub qty: i64,
    /// Whether the caller has reviewed this product (as of this read).
    pub reviewed: bool,
}

/// A user-facing order summary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    pub total: Decimal,
    pub items: Vec<OrderSummaryLine>,
}

/// Order query failures.
#[derive(Debug, Error)]
pub enum OrderQueryError {
    #[error("order id is not a valid identifier")]
    InvalidOrderId,

    #[error("order not found")]
    NotFound,

    #[error("caller may not access this order")]
    Forbidden,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// List the caller's orders, newest first, with review enrichment.
///
/// Collects the distinct product ids across all returned line items and
/// fetches the caller's reviews for exactly that set in one query.
///
/// # Errors
///
/// Returns `OrderQueryError::Repository` if a read fails.
#[instrument(skip(pool, caller), fields(user_id = %caller.id))]
pub async fn list_my_orders(
    pool: &PgPool,
    caller: &CurrentUser,
) -> Result<Vec<OrderSummary>, OrderQueryError> {
    let orders = OrderRepository::new(pool).list_for_user(caller.id).await?;

    let product_ids: Vec<ProductId> = {
        let mut seen = HashSet::new();
        orders
            .iter()
            .flat_map(|o| o.items.iter())
            .filter_map(|line| line.product_id)
            .filter(|id| seen.insert(*id))
            .collect()
    };

    let reviewed = ReviewRepository::new(pool)
        .reviewed_product_ids(caller.id, &product_ids)
        .await?;

    Ok(orders.iter().map(|o| summarize(o, &reviewed)).collect())
}

/// Build a summary for one order against the caller's reviewed set.
fn summarize(order: &Order, reviewed: &HashSet<ProductId>) -> OrderSummary {
    OrderSummary {
        order_id: order.id,
        status: order.status,
        date: order.created_at,
        total: order.totals.grand_total,
        items: order
            .items
            .iter()
            .map(|line| OrderSummaryLine {
                product_id: line.product_id,
                name: line.name.clone(),
                qty: line.qty,
                reviewed: line
                    .product_id
                    .is_some_and(|id| reviewed.contains(&id)),
            })
            .collect(),
    }
}

/// Load one order, enforcing ownership.
///
/// # Errors
///
/// Returns `InvalidOrderId` for a malformed id, `NotFound` for a missing
/// order, and `Forbidden` unless the caller owns the order or is an
/// administrator.
#[instrument(skip(pool, caller), fields(user_id = %caller.id))]
pub async fn get_order(
    pool: &PgPool,
    caller: &CurrentUser,
    raw_id: &str,
) -> Result<Order, OrderQueryError> {
    let id = OrderId::parse(raw_id).map_err(|_| OrderQueryError::InvalidOrderId)?;

    let order = OrderRepository::new(pool)
        .get_by_id(id)
        .await?
        .ok_or(OrderQueryError::NotFound)?;

    let is_owner = order.user_id.is_some_and(|owner| owner == caller.id);
    if !is_owner && !caller.is_admin {
        return Err(OrderQueryError::Forbidden);
    }

    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use velostore_core::{DeliveryMethod, PaymentMethod};

    use crate::models::order::{OrderLine, Totals};

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn order_line(product_id: Option<ProductId>, name: &str) -> OrderLine {
        OrderLine {
            product_id,
            name: name.to_owned(),
            qty: 1,
            unit_price: dec("10"),
            line_total: dec("10"),
        }
    }

    fn order_with_lines(items: Vec<OrderLine>) -> Order {
        Order {
            id: OrderId::generate(),
            user_id: None,
            user_email: String::new(),
            items,
            payment: PaymentMethod::Card,
            delivery: DeliveryMethod::Pickup,
            shipping_address: None,
            totals: Totals::compute(dec("10"), Decimal::ZERO),
            status: OrderStatus::Created,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summarize_marks_only_reviewed_products() {
        let reviewed_id = ProductId::generate();
        let other_id = ProductId::generate();
        let order = order_with_lines(vec![
            order_line(Some(reviewed_id), "Helmet"),
            order_line(Some(other_id), "Pump"),
        ]);
        let reviewed = HashSet::from([reviewed_id]);

        let summary = summarize(&order, &reviewed);

        assert_eq!(summary.items.len(), 2);
        assert!(summary.items.first().unwrap().reviewed);
        assert!(!summary.items.get(1).unwrap().reviewed);
    }

    #[test]
    fn test_summarize_legacy_line_without_product_id() {
        let order = order_with_lines(vec![order_line(None, "Old line")]);
        let reviewed = HashSet::from([ProductId::generate()]);

        let summary = summarize(&order, &reviewed);

        let line = summary.items.first().unwrap();
        assert_eq!(line.product_id, None);
        assert!(!line.reviewed);
    }

    #[test]
    fn test_summarize_carries_totals_and_status() {
        let order = order_with_lines(vec![order_line(Some(ProductId::generate()), "Helmet")]);

        let summary = summarize(&order, &HashSet::new());

        assert_eq!(summary.order_id, order.id);
        assert_eq!(summary.status, OrderStatus::Created);
        assert_eq!(summary.total, order.totals.grand_total);
        assert_eq!(summary.date, order.created_at);
    }
}
