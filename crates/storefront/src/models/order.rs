//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use velostore_core::{
    DeliveryMethod, OrderId, OrderStatus, PaymentMethod, ProductId, UserId, round_cents,
};

/// An immutable order line snapshot.
///
/// Captured at order creation from the then-current product record and never
/// re-derived afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// `None` when a legacy record carried a product reference that no
    /// longer parses as an identifier.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub qty: i64,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Resolved shipping address stored on an order.
///
/// Guest-sourced addresses are complete (full name, street, city, postal
/// code); profile-sourced addresses may lack city and postal code when the
/// stored profile predates structured addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Totals block computed at order time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub items_total: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub grand_total: Decimal,
}

impl Totals {
    /// Compute the totals block for an items subtotal plus shipping fee.
    ///
    /// Tax is 22% of the items total. Rounding to cents happens at the tax
    /// and grand-total steps only, never per line, so rounding error does
    /// not compound. Both pricing flows (cart pricing and order assembly)
    /// share this routine.
    #[must_use]
    pub fn compute(items_total: Decimal, shipping: Decimal) -> Self {
        let tax = round_cents(items_total * tax_rate());
        let grand_total = round_cents(items_total + tax + shipping);
        Self {
            items_total,
            tax,
            shipping,
            grand_total,
        }
    }
}

/// Tax rate applied to items totals.
fn tax_rate() -> Decimal {
    Decimal::new(22, 2)
}

/// A persisted order.
///
/// Created atomically by the order assembly engine after all validation
/// passes; subsequently mutated only by fulfillment status transitions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// `None` for guest orders.
    pub user_id: Option<UserId>,
    /// Denormalized at creation; empty for guest orders.
    pub user_email: String,
    pub items: Vec<OrderLine>,
    pub payment: PaymentMethod,
    pub delivery: DeliveryMethod,
    /// `None` when delivery is pickup.
    pub shipping_address: Option<ShippingAddress>,
    pub totals: Totals,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Parameters for persisting a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub user_email: String,
    pub items: Vec<OrderLine>,
    pub payment: PaymentMethod,
    pub delivery: DeliveryMethod,
    pub shipping_address: Option<ShippingAddress>,
    pub totals: Totals,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_compute_totals_example() {
        // 220 subtotal, 5 shipping: tax 48.40, grand total 273.40
        let totals = Totals::compute(dec("220"), dec("5"));
        assert_eq!(totals.items_total, dec("220"));
        assert_eq!(totals.tax, dec("48.40"));
        assert_eq!(totals.shipping, dec("5"));
        assert_eq!(totals.grand_total, dec("273.40"));
    }

    #[test]
    fn test_compute_totals_rounds_tax_only_once() {
        // 33.33 * 0.22 = 7.3326 -> 7.33; 33.33 + 7.33 + 5 = 45.66
        let totals = Totals::compute(dec("33.33"), dec("5"));
        assert_eq!(totals.tax, dec("7.33"));
        assert_eq!(totals.grand_total, dec("45.66"));
    }

    #[test]
    fn test_compute_totals_zero_shipping() {
        let totals = Totals::compute(dec("100"), Decimal::ZERO);
        assert_eq!(totals.tax, dec("22.00"));
        assert_eq!(totals.grand_total, dec("122.00"));
    }

    #[test]
    fn test_shipping_address_serializes_absent_fields_as_absent() {
        let addr = ShippingAddress {
            full_name: "A B".to_owned(),
            street: "Main St 1".to_owned(),
            city: None,
            postal_code: None,
            phone: None,
        };
        let json = serde_json::to_value(&addr).unwrap();
        assert_eq!(json["street"], "Main St 1");
        assert!(json.get("city").is_none());
        assert!(json.get("postalCode").is_none());
    }
}
