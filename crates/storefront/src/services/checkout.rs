//! Order assembly engine.
//!
//! Takes a checkout request (raw product+quantity items, payment and
//! delivery methods, optional guest address), resolves the shipping address
//! across the guest/authenticated paths, re-prices every item from the
//! current catalog, and persists a single immutable order snapshot.
//!
//! This is the variant-less pricing flow; it shares the totals routine with
//! the cart pricing engine but never trusts a client-supplied price - unit
//! prices are always read fresh from the product record.
//!
//! All validation happens before the one and only write; there are no
//! partial writes on any failure path.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use rust_decimal::Decimal;
use velostore_core::{DeliveryMethod, OrderId, PaymentMethod, ProductId};

use crate::db::RepositoryError;
use crate::db::catalog::ProductRepository;
use crate::db::orders::OrderRepository;
use crate::db::users::UserRepository;
use crate::models::order::{NewOrder, OrderLine, ShippingAddress, Totals};
use crate::models::product::Product;
use crate::models::user::{CurrentUser, User};
use crate::services::standard_shipping_fee;

/// Full name used for profile-derived addresses when the profile has no
/// name fields at all.
const FALLBACK_FULL_NAME: &str = "Customer";

/// One requested order item. The quantity stays unvalidated (`None` when it
/// is not a positive integer) until after the product batch load, so
/// `PRODUCT_NOT_FOUND` is reported before `INVALID_QTY`.
#[derive(Debug, Clone, Copy)]
struct OrderItemInput {
    product_id: ProductId,
    qty: Option<i64>,
}

/// A parsed, syntactically valid checkout request.
#[derive(Debug)]
struct CheckoutRequest {
    items: Vec<OrderItemInput>,
    payment: PaymentMethod,
    delivery: DeliveryMethod,
    guest_address: Option<ShippingAddress>,
}

/// Order assembly failures.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("order items are required")]
    ItemsRequired,

    #[error("payment and delivery methods are required")]
    PaymentAndDeliveryRequired,

    #[error("unknown delivery method")]
    InvalidDeliveryMethod,

    #[error("unknown payment method")]
    InvalidPaymentMethod,

    #[error("order product id is not a valid identifier")]
    InvalidProductId,

    #[error("one or more products were not found")]
    ProductNotFound,

    #[error("order quantity must be a positive integer")]
    InvalidQty,

    #[error("a shipping address is required for courier delivery")]
    ShippingAddressRequired,

    #[error("no usable address on the caller's profile")]
    ProfileAddressMissing,

    #[error("authenticated user no longer exists")]
    UserNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Assemble and persist an order.
///
/// `body` is the raw request body; `caller` is the per-request resolved
/// identity, `None` for guests.
///
/// # Errors
///
/// Returns a [`CheckoutError`] for the first violation found; nothing is
/// written unless every check passes.
#[instrument(skip(pool, caller, body), fields(authenticated = caller.is_some()))]
pub async fn create_order(
    pool: &PgPool,
    caller: Option<&CurrentUser>,
    body: Option<&Value>,
) -> Result<OrderId, CheckoutError> {
    let request = parse_checkout_request(body)?;

    // Address resolution needs the stored profile only on the
    // courier-without-guest-address path for an authenticated caller.
    let profile = match (
        request.delivery,
        request.guest_address.is_some(),
        caller,
    ) {
        (DeliveryMethod::Courier, false, Some(current)) => Some(
            UserRepository::new(pool)
                .get_by_id(current.id)
                .await?
                .ok_or(CheckoutError::UserNotFound)?,
        ),
        _ => None,
    };

    let shipping_address = resolve_shipping_address(
        request.delivery,
        request.guest_address,
        caller.is_some(),
        profile.as_ref(),
    )?;

    // Batch-load the deduplicated product set; a count mismatch means at
    // least one referenced product does not exist.
    let product_ids: Vec<ProductId> = {
        let mut seen = HashSet::new();
        request
            .items
            .iter()
            .map(|i| i.product_id)
            .filter(|id| seen.insert(*id))
            .collect()
    };
    let products: HashMap<ProductId, Product> = ProductRepository::new(pool)
        .get_by_ids(&product_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    if products.len() != product_ids.len() {
        return Err(CheckoutError::ProductNotFound);
    }

    let (items, items_total) = build_order_lines(&request.items, &products)?;

    let shipping = match request.delivery {
        DeliveryMethod::Courier => standard_shipping_fee(),
        DeliveryMethod::Pickup => Decimal::ZERO,
    };
    let totals = Totals::compute(items_total, shipping);

    let order_id = OrderRepository::new(pool)
        .insert(NewOrder {
            user_id: caller.map(|c| c.id),
            user_email: caller.map(|c| c.email.to_string()).unwrap_or_default(),
            items,
            payment: request.payment,
            delivery: request.delivery,
            shipping_address,
            totals,
        })
        .await?;

    Ok(order_id)
}

/// Parse and validate the checkout request body.
fn parse_checkout_request(body: Option<&Value>) -> Result<CheckoutRequest, CheckoutError> {
    let body = body.unwrap_or(&Value::Null);

    let Some(Value::Array(raw_items)) = body.get("items") else {
        return Err(CheckoutError::ItemsRequired);
    };
    if raw_items.is_empty() {
        return Err(CheckoutError::ItemsRequired);
    }

    let payment_raw = trimmed_field(body, "payment");
    let delivery_raw = trimmed_field(body, "delivery");
    let (Some(payment_raw), Some(delivery_raw)) = (payment_raw, delivery_raw) else {
        return Err(CheckoutError::PaymentAndDeliveryRequired);
    };
    let delivery =
        DeliveryMethod::parse(&delivery_raw).ok_or(CheckoutError::InvalidDeliveryMethod)?;
    let payment = PaymentMethod::parse(&payment_raw).ok_or(CheckoutError::InvalidPaymentMethod)?;

    let items = raw_items
        .iter()
        .map(parse_order_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CheckoutRequest {
        items,
        payment,
        delivery,
        guest_address: normalize_guest_address(body.get("shippingAddress")),
    })
}

/// A non-empty, trimmed string field of the body, if present.
fn trimmed_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn parse_order_item(value: &Value) -> Result<OrderItemInput, CheckoutError> {
    let product_id = value
        .get("productId")
        .and_then(Value::as_str)
        .and_then(|s| ProductId::parse(s).ok())
        .ok_or(CheckoutError::InvalidProductId)?;

    let qty = value.get("qty").and_then(Value::as_i64).filter(|q| *q >= 1);

    Ok(OrderItemInput { product_id, qty })
}

/// Normalize a guest-supplied address.
///
/// A guest address is usable only when full name, street, city, and postal
/// code are all present and non-empty; anything less is treated as no guest
/// address at all, so resolution falls through to the profile path.
fn normalize_guest_address(value: Option<&Value>) -> Option<ShippingAddress> {
    let value = value?;

    let field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    Some(ShippingAddress {
        full_name: field("fullName")?,
        street: field("street")?,
        city: Some(field("city")?),
        postal_code: Some(field("postalCode")?),
        phone: field("phone"),
    })
}

/// Resolve the shipping address for an order.
///
/// The delivery method is the discriminant:
/// - pickup orders carry no address;
/// - courier orders use a complete guest address verbatim when supplied;
/// - otherwise an authenticated caller's profile is consulted;
/// - otherwise the request fails.
fn resolve_shipping_address(
    delivery: DeliveryMethod,
    guest: Option<ShippingAddress>,
    authenticated: bool,
    profile: Option<&User>,
) -> Result<Option<ShippingAddress>, CheckoutError> {
    match delivery {
        DeliveryMethod::Pickup => Ok(None),
        DeliveryMethod::Courier => {
            if let Some(address) = guest {
                return Ok(Some(address));
            }
            if authenticated {
                let user = profile.ok_or(CheckoutError::UserNotFound)?;
                return derive_profile_address(user)
                    .map(Some)
                    .ok_or(CheckoutError::ProfileAddressMissing);
            }
            Err(CheckoutError::ShippingAddressRequired)
        }
    }
}

/// Derive a shipping address from a stored profile.
///
/// The legacy profile keeps a flat delivery-address string that becomes the
/// street line; city and postal code may be absent. Returns `None` when the
/// profile has no street, which is the one field that cannot be defaulted.
fn derive_profile_address(user: &User) -> Option<ShippingAddress> {
    let street = user.delivery_address.trim();
    if street.is_empty() {
        return None;
    }

    Some(ShippingAddress {
        full_name: build_full_name(user),
        street: street.to_owned(),
        city: None,
        postal_code: None,
        phone: Some(user.phone.trim().to_owned()).filter(|p| !p.is_empty()),
    })
}

fn build_full_name(user: &User) -> String {
    let full = format!("{} {}", user.first_name.trim(), user.last_name.trim())
        .trim()
        .to_owned();
    if full.is_empty() {
        FALLBACK_FULL_NAME.to_owned()
    } else {
        full
    }
}

/// Build immutable order lines from current product records.
///
/// Quantities are validated here, after the product load; unit prices come
/// from the product records, never from the client.
fn build_order_lines(
    items: &[OrderItemInput],
    products: &HashMap<ProductId, Product>,
) -> Result<(Vec<OrderLine>, Decimal), CheckoutError> {
    let mut lines = Vec::with_capacity(items.len());
    let mut items_total = Decimal::ZERO;

    for item in items {
        let product = products
            .get(&item.product_id)
            .ok_or(CheckoutError::ProductNotFound)?;
        let qty = item.qty.ok_or(CheckoutError::InvalidQty)?;

        let unit_price = product.price;
        let line_total = unit_price * Decimal::from(qty);
        items_total += line_total;

        lines.push(OrderLine {
            product_id: Some(product.id),
            name: product.name.clone(),
            qty,
            unit_price,
            line_total,
        });
    }

    Ok((lines, items_total))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use velostore_core::{Email, ProductType, UserId};

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn profile_user(first: &str, last: &str, delivery_address: &str) -> User {
        User {
            id: UserId::generate(),
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            email: Email::parse("rider@example.com").unwrap(),
            delivery_address: delivery_address.to_owned(),
            phone: String::new(),
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn guest_address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ana Kovač".to_owned(),
            street: "Trubarjeva 7".to_owned(),
            city: Some("Ljubljana".to_owned()),
            postal_code: Some("1000".to_owned()),
            phone: None,
        }
    }

    fn product(id: ProductId, name: &str, price: &str) -> Product {
        Product {
            id,
            name: name.to_owned(),
            price: dec(price),
            product_type: ProductType::Equipment,
            in_stock: true,
            short_description: None,
            long_description: None,
            brand: None,
            image_url: None,
            rating_avg: None,
            rating_count: 0,
            created_at: Utc::now(),
        }
    }

    // -- request parsing --

    #[test]
    fn test_parse_requires_items() {
        assert!(matches!(
            parse_checkout_request(None),
            Err(CheckoutError::ItemsRequired)
        ));
        let body = json!({"items": [], "payment": "card", "delivery": "pickup"});
        assert!(matches!(
            parse_checkout_request(Some(&body)),
            Err(CheckoutError::ItemsRequired)
        ));
    }

    #[test]
    fn test_parse_requires_payment_and_delivery() {
        let body = json!({"items": [{"productId": ProductId::generate(), "qty": 1}]});
        assert!(matches!(
            parse_checkout_request(Some(&body)),
            Err(CheckoutError::PaymentAndDeliveryRequired)
        ));

        let body = json!({
            "items": [{"productId": ProductId::generate(), "qty": 1}],
            "payment": "  ",
            "delivery": "pickup"
        });
        assert!(matches!(
            parse_checkout_request(Some(&body)),
            Err(CheckoutError::PaymentAndDeliveryRequired)
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_delivery() {
        let body = json!({
            "items": [{"productId": ProductId::generate(), "qty": 1}],
            "payment": "card",
            "delivery": "drone"
        });
        assert!(matches!(
            parse_checkout_request(Some(&body)),
            Err(CheckoutError::InvalidDeliveryMethod)
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_payment() {
        let body = json!({
            "items": [{"productId": ProductId::generate(), "qty": 1}],
            "payment": "barter",
            "delivery": "pickup"
        });
        assert!(matches!(
            parse_checkout_request(Some(&body)),
            Err(CheckoutError::InvalidPaymentMethod)
        ));
    }

    #[test]
    fn test_parse_accepts_legacy_cod_payment() {
        let body = json!({
            "items": [{"productId": ProductId::generate(), "qty": 1}],
            "payment": "cod",
            "delivery": "pickup"
        });
        let request = parse_checkout_request(Some(&body)).unwrap();
        assert_eq!(request.payment, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_parse_rejects_bad_product_id() {
        let body = json!({
            "items": [{"productId": "64b2f0c8a1d4e5f6a7b8c9d0", "qty": 1}],
            "payment": "card",
            "delivery": "pickup"
        });
        assert!(matches!(
            parse_checkout_request(Some(&body)),
            Err(CheckoutError::InvalidProductId)
        ));
    }

    #[test]
    fn test_parse_keeps_bad_qty_for_later_validation() {
        let body = json!({
            "items": [{"productId": ProductId::generate(), "qty": 0}],
            "payment": "card",
            "delivery": "pickup"
        });
        let request = parse_checkout_request(Some(&body)).unwrap();
        assert_eq!(request.items.first().unwrap().qty, None);
    }

    // -- guest address normalization --

    #[test]
    fn test_guest_address_complete() {
        let value = json!({
            "fullName": "Ana Kovač",
            "street": "Trubarjeva 7",
            "city": "Ljubljana",
            "postalCode": "1000",
            "phone": ""
        });
        let address = normalize_guest_address(Some(&value)).unwrap();
        assert_eq!(address.full_name, "Ana Kovač");
        assert_eq!(address.city.as_deref(), Some("Ljubljana"));
        assert_eq!(address.phone, None);
    }

    #[test]
    fn test_guest_address_incomplete_is_unusable() {
        // Missing postal code: not an error, just no guest address.
        let value = json!({
            "fullName": "Ana Kovač",
            "street": "Trubarjeva 7",
            "city": "Ljubljana"
        });
        assert!(normalize_guest_address(Some(&value)).is_none());
        assert!(normalize_guest_address(None).is_none());
        assert!(normalize_guest_address(Some(&json!("flat string"))).is_none());
    }

    // -- address resolution matrix (all six reachable combinations) --

    #[test]
    fn test_resolution_pickup_has_no_address() {
        // Guest address and profile both present; pickup still wins.
        let user = profile_user("Ana", "Kovač", "Trubarjeva 7");
        let resolved = resolve_shipping_address(
            DeliveryMethod::Pickup,
            Some(guest_address()),
            true,
            Some(&user),
        )
        .unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_resolution_courier_guest_address_supplied() {
        let resolved =
            resolve_shipping_address(DeliveryMethod::Courier, Some(guest_address()), false, None)
                .unwrap();
        assert_eq!(resolved, Some(guest_address()));
    }

    #[test]
    fn test_resolution_courier_guest_address_wins_over_profile() {
        let user = profile_user("Bo", "Zeman", "Other St 2");
        let resolved = resolve_shipping_address(
            DeliveryMethod::Courier,
            Some(guest_address()),
            true,
            Some(&user),
        )
        .unwrap();
        assert_eq!(resolved.unwrap().street, "Trubarjeva 7");
    }

    #[test]
    fn test_resolution_courier_profile_derived() {
        // Authenticated, no guest address, profile has a street but no
        // city/postal code: the address is derived with those fields absent.
        let user = profile_user("Ana", "Kovač", "Main St 1");
        let resolved =
            resolve_shipping_address(DeliveryMethod::Courier, None, true, Some(&user)).unwrap();
        let address = resolved.unwrap();
        assert_eq!(address.full_name, "Ana Kovač");
        assert_eq!(address.street, "Main St 1");
        assert_eq!(address.city, None);
        assert_eq!(address.postal_code, None);
    }

    #[test]
    fn test_resolution_courier_profile_without_street_fails() {
        let user = profile_user("Ana", "Kovač", "  ");
        let err =
            resolve_shipping_address(DeliveryMethod::Courier, None, true, Some(&user)).unwrap_err();
        assert!(matches!(err, CheckoutError::ProfileAddressMissing));
    }

    #[test]
    fn test_resolution_courier_anonymous_without_address_fails() {
        let err = resolve_shipping_address(DeliveryMethod::Courier, None, false, None).unwrap_err();
        assert!(matches!(err, CheckoutError::ShippingAddressRequired));
    }

    #[test]
    fn test_profile_full_name_falls_back_to_placeholder() {
        let user = profile_user("  ", "", "Main St 1");
        let address = derive_profile_address(&user).unwrap();
        assert_eq!(address.full_name, FALLBACK_FULL_NAME);
    }

    // -- order lines and totals --

    #[test]
    fn test_build_order_lines_prices_from_catalog() {
        let pid = ProductId::generate();
        let products = HashMap::from([(pid, product(pid, "Pump", "9.99"))]);
        let items = [OrderItemInput {
            product_id: pid,
            qty: Some(3),
        }];

        let (lines, items_total) = build_order_lines(&items, &products).unwrap();
        let order_line = lines.first().unwrap();
        assert_eq!(order_line.name, "Pump");
        assert_eq!(order_line.unit_price, dec("9.99"));
        assert_eq!(order_line.line_total, dec("29.97"));
        assert_eq!(items_total, dec("29.97"));
    }

    #[test]
    fn test_build_order_lines_rejects_bad_qty() {
        let pid = ProductId::generate();
        let products = HashMap::from([(pid, product(pid, "Pump", "9.99"))]);
        let items = [OrderItemInput {
            product_id: pid,
            qty: None,
        }];

        assert!(matches!(
            build_order_lines(&items, &products),
            Err(CheckoutError::InvalidQty)
        ));
    }

    #[test]
    fn test_order_totals_follow_single_policy() {
        // One consistent totals policy across both pricing flows: 22% tax
        // and the flat courier fee, not the legacy zero-tax/2.99 revision.
        let totals = Totals::compute(dec("100"), standard_shipping_fee());
        assert_eq!(totals.tax, dec("22.00"));
        assert_eq!(totals.shipping, dec("5"));
        assert_eq!(totals.grand_total, dec("127.00"));

        let pickup = Totals::compute(dec("100"), Decimal::ZERO);
        assert_eq!(pickup.shipping, Decimal::ZERO);
        assert_eq!(pickup.grand_total, dec("122.00"));
    }
}
