//! Order repository.
//!
//! Orders are append-mostly: the only write here is the single-row insert
//! performed by the order assembly engine, which is atomic per order. Line
//! items are stored as JSONB; historical records encode the product
//! reference in several shapes, and [`normalize_line`] converts all of them
//! into [`OrderLine`] once, at this boundary, so nothing downstream ever
//! sniffs shapes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use velostore_core::{DeliveryMethod, OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{NewOrder, Order, OrderLine, ShippingAddress, Totals};

/// Repository for order persistence and retrieval.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Option<Uuid>,
    user_email: String,
    items: Value,
    payment: String,
    delivery: String,
    shipping_address: Option<Value>,
    items_total: Decimal,
    tax: Decimal,
    shipping: Decimal,
    grand_total: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment = PaymentMethod::parse(&row.payment).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown payment method: {}", row.payment))
        })?;
        let delivery = DeliveryMethod::parse(&row.delivery).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown delivery method: {}", row.delivery))
        })?;
        let status = OrderStatus::parse(&row.status).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown order status: {}", row.status))
        })?;

        let items = match &row.items {
            Value::Array(lines) => lines.iter().map(normalize_line).collect(),
            other => {
                return Err(RepositoryError::DataCorruption(format!(
                    "order items are not an array: {other}"
                )));
            }
        };

        let shipping_address = row
            .shipping_address
            .map(serde_json::from_value::<ShippingAddress>)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid order address: {e}")))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            user_email: row.user_email,
            items,
            payment,
            delivery,
            shipping_address,
            totals: Totals {
                items_total: row.items_total,
                tax: row.tax,
                shipping: row.shipping,
                grand_total: row.grand_total,
            },
            status,
            created_at: row.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, user_email, items, payment, delivery, \
     shipping_address, items_total, tax, shipping, grand_total, status, created_at";

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new order as a single row insert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, order: NewOrder) -> Result<OrderId, RepositoryError> {
        let items = serde_json::to_value(&order.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize order items: {e}"))
        })?;
        let shipping_address = order
            .shipping_address
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("failed to serialize order address: {e}"))
            })?;

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO orders \
             (user_id, user_email, items, payment, delivery, shipping_address, \
              items_total, tax, shipping, grand_total, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING id",
        )
        .bind(order.user_id.as_ref().map(UserId::as_uuid))
        .bind(&order.user_email)
        .bind(&items)
        .bind(order.payment.as_str())
        .bind(order.delivery.as_str())
        .bind(&shipping_address)
        .bind(order.totals.items_total)
        .bind(order.totals.tax)
        .bind(order.totals.shipping)
        .bind(order.totals.grand_total)
        .bind(OrderStatus::Created.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(OrderId::new(id))
    }

    /// Load a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored order is unreadable.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored order is unreadable.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(self.pool)
                .await?;

        row.map(Order::try_from).transpose()
    }
}

// =============================================================================
// Legacy line-item normalization
// =============================================================================

/// Normalize one stored line item into an [`OrderLine`].
///
/// Accepts the canonical shape written by this crate plus the historical
/// encodings of the product reference:
///
/// - `{"productId": "<id>"}` (canonical)
/// - `{"productId": {"_id": "<id>"}}` (embedded product object)
/// - `{"product_id": "<id>"}` (snake_case)
/// - `{"product": {"_id": "<id>"}}` (nested product sub-object)
///
/// Quantities and amounts are accepted as JSON numbers or strings. A line
/// that is not an object, or whose fields are missing, degrades to empty
/// defaults rather than failing the whole order read.
fn normalize_line(value: &Value) -> OrderLine {
    let product_id = product_ref(value).and_then(|raw| ProductId::parse(raw).ok());

    let name = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let qty = value
        .get("qty")
        .or_else(|| value.get("quantity"))
        .and_then(Value::as_i64)
        .unwrap_or(0);

    OrderLine {
        product_id,
        name,
        qty,
        unit_price: decimal_field(value, "unitPrice"),
        line_total: decimal_field(value, "lineTotal"),
    }
}

/// Extract the raw product reference string from any of the legacy shapes.
fn product_ref(value: &Value) -> Option<&str> {
    if let Some(id) = value.get("productId") {
        match id {
            Value::String(s) => return Some(s),
            Value::Object(obj) => return obj.get("_id").and_then(Value::as_str),
            _ => {}
        }
    }
    if let Some(s) = value.get("product_id").and_then(Value::as_str) {
        return Some(s);
    }
    value
        .get("product")
        .and_then(|p| p.get("_id"))
        .and_then(Value::as_str)
}

/// Read a decimal field that may be stored as a JSON number or string.
fn decimal_field(value: &Value, key: &str) -> Decimal {
    match value.get(key) {
        Some(Value::String(s)) => s.parse().unwrap_or(Decimal::ZERO),
        Some(Value::Number(n)) => n.to_string().parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    const PID: &str = "4f9d2c8e-6a1b-4c3d-9e8f-7a6b5c4d3e2f";

    #[test]
    fn test_normalize_canonical_shape() {
        let line = normalize_line(&json!({
            "productId": PID,
            "name": "Gravel bike",
            "qty": 2,
            "unitPrice": "110",
            "lineTotal": "220"
        }));
        assert_eq!(line.product_id, Some(ProductId::parse(PID).unwrap()));
        assert_eq!(line.name, "Gravel bike");
        assert_eq!(line.qty, 2);
        assert_eq!(line.unit_price, "110".parse().unwrap());
        assert_eq!(line.line_total, "220".parse().unwrap());
    }

    #[test]
    fn test_normalize_embedded_product_id_object() {
        let line = normalize_line(&json!({
            "productId": {"_id": PID},
            "name": "Helmet",
            "qty": 1,
            "unitPrice": 25.5,
            "lineTotal": 25.5
        }));
        assert_eq!(line.product_id, Some(ProductId::parse(PID).unwrap()));
        assert_eq!(line.unit_price, "25.5".parse().unwrap());
    }

    #[test]
    fn test_normalize_snake_case_product_id() {
        let line = normalize_line(&json!({
            "product_id": PID,
            "name": "Jersey",
            "qty": 3,
            "unitPrice": 40,
            "lineTotal": 120
        }));
        assert_eq!(line.product_id, Some(ProductId::parse(PID).unwrap()));
        assert_eq!(line.qty, 3);
    }

    #[test]
    fn test_normalize_nested_product_object() {
        let line = normalize_line(&json!({
            "product": {"_id": PID, "name": "ignored"},
            "name": "Pump",
            "quantity": 4,
            "unitPrice": "9.99",
            "lineTotal": "39.96"
        }));
        assert_eq!(line.product_id, Some(ProductId::parse(PID).unwrap()));
        assert_eq!(line.qty, 4);
    }

    #[test]
    fn test_normalize_unparseable_reference() {
        // Legacy document-store ids do not parse as UUIDs
        let line = normalize_line(&json!({
            "productId": "64b2f0c8a1d4e5f6a7b8c9d0",
            "name": "Old line",
            "qty": 1,
            "unitPrice": 10,
            "lineTotal": 10
        }));
        assert_eq!(line.product_id, None);
        assert_eq!(line.name, "Old line");
    }

    #[test]
    fn test_normalize_malformed_line_degrades() {
        let line = normalize_line(&json!("not an object"));
        assert_eq!(line.product_id, None);
        assert_eq!(line.name, "");
        assert_eq!(line.qty, 0);
        assert_eq!(line.unit_price, Decimal::ZERO);
    }

    #[test]
    fn test_written_lines_round_trip_through_normalization() {
        let original = OrderLine {
            product_id: Some(ProductId::parse(PID).unwrap()),
            name: "Gravel bike".to_owned(),
            qty: 2,
            unit_price: "110".parse().unwrap(),
            line_total: "220".parse().unwrap(),
        };
        let stored = serde_json::to_value(vec![original.clone()]).unwrap();
        let lines: Vec<OrderLine> = stored
            .as_array()
            .unwrap()
            .iter()
            .map(normalize_line)
            .collect();
        assert_eq!(lines, vec![original]);
    }
}
