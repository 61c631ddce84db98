//! Closed-set enums for the catalog and order domain.
//!
//! Each enum is stored as its lowercase text form in the database and
//! accepted in that form on the wire; `parse` is the single place unknown
//! values are rejected.

use serde::{Deserialize, Serialize};

/// Product category in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Bicycle,
    Equipment,
    Clothing,
}

impl ProductType {
    /// Text form used in the database and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bicycle => "bicycle",
            Self::Equipment => "equipment",
            Self::Clothing => "clothing",
        }
    }

    /// Parse from the text form. Returns `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bicycle" => Some(Self::Bicycle),
            "equipment" => Some(Self::Equipment),
            "clothing" => Some(Self::Clothing),
            _ => None,
        }
    }
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Card,
    /// Accepted on the wire as `cash-on-delivery` or the legacy `cod`.
    #[serde(alias = "cod")]
    CashOnDelivery,
    Bank,
}

impl PaymentMethod {
    /// Text form used in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::CashOnDelivery => "cash-on-delivery",
            Self::Bank => "bank",
        }
    }

    /// Parse from the text form, accepting the legacy `cod` alias.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(Self::Card),
            "cash-on-delivery" | "cod" => Some(Self::CashOnDelivery),
            "bank" => Some(Self::Bank),
            _ => None,
        }
    }
}

/// Delivery method chosen at checkout.
///
/// The delivery method is the discriminant of shipping-address resolution:
/// `pickup` orders carry no address at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Courier,
    Pickup,
}

impl DeliveryMethod {
    /// Text form used in the database and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Courier => "courier",
            Self::Pickup => "pickup",
        }
    }

    /// Parse from the text form. Returns `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "courier" => Some(Self::Courier),
            "pickup" => Some(Self::Pickup),
            _ => None,
        }
    }
}

/// Order lifecycle status.
///
/// Orders are created as [`OrderStatus::Created`]; later transitions are
/// driven by fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Created,
    Paid,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    /// Text form used in the database and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from the text form. Returns `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "paid" => Some(Self::Paid),
            "shipped" => Some(Self::Shipped),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_text_forms() {
        for pt in [
            ProductType::Bicycle,
            ProductType::Equipment,
            ProductType::Clothing,
        ] {
            assert_eq!(ProductType::parse(pt.as_str()), Some(pt));
        }
        for pm in [
            PaymentMethod::Card,
            PaymentMethod::CashOnDelivery,
            PaymentMethod::Bank,
        ] {
            assert_eq!(PaymentMethod::parse(pm.as_str()), Some(pm));
        }
        for dm in [DeliveryMethod::Courier, DeliveryMethod::Pickup] {
            assert_eq!(DeliveryMethod::parse(dm.as_str()), Some(dm));
        }
        for os in [
            OrderStatus::Created,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(os.as_str()), Some(os));
        }
    }

    #[test]
    fn test_payment_cod_alias() {
        assert_eq!(
            PaymentMethod::parse("cod"),
            Some(PaymentMethod::CashOnDelivery)
        );
        let parsed: PaymentMethod = serde_json::from_str("\"cod\"").unwrap();
        assert_eq!(parsed, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_unknown_values_rejected() {
        assert_eq!(DeliveryMethod::parse("drone"), None);
        assert_eq!(PaymentMethod::parse(""), None);
        assert_eq!(ProductType::parse("Bicycle"), None);
    }

    #[test]
    fn test_serde_wire_form() {
        assert_eq!(
            serde_json::to_string(&DeliveryMethod::Courier).unwrap(),
            "\"courier\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"cash-on-delivery\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Created).unwrap(),
            "\"created\""
        );
    }
}
