//! Business logic services.
//!
//! Services sit between the HTTP routes and the repositories. The two
//! pricing flows - variant-based cart pricing and variant-less order
//! assembly - are deliberately separate named operations that share the
//! totals routine in [`crate::models::order::Totals`].
//!
//! Each service keeps its computation kernel pure (plain functions over
//! pre-fetched records) so the business rules are unit-testable without a
//! database; the async entry points only orchestrate repository calls
//! around those kernels.

pub mod auth;
pub mod checkout;
pub mod orders;
pub mod pricing;
pub mod reviews;

use rust_decimal::Decimal;

/// Flat shipping fee charged once per shipped order or priced cart.
pub(crate) fn standard_shipping_fee() -> Decimal {
    Decimal::new(5, 0)
}
