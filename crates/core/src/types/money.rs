//! Money rounding helpers.
//!
//! All monetary amounts in Velostore are [`rust_decimal::Decimal`] values.
//! Totals are rounded to 2 decimal places at the tax and grand-total steps
//! only, never per line, so rounding error does not compound.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to 2 decimal places.
///
/// Midpoints round away from zero (standard commercial rounding, not
/// truncation and not banker's rounding).
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_round_exact_value_unchanged() {
        assert_eq!(round_cents(dec("48.40")), dec("48.40"));
    }

    #[test]
    fn test_round_midpoint_away_from_zero() {
        assert_eq!(round_cents(dec("1.005")), dec("1.01"));
        assert_eq!(round_cents(dec("2.675")), dec("2.68"));
    }

    #[test]
    fn test_round_down_below_midpoint() {
        assert_eq!(round_cents(dec("1.004")), dec("1.00"));
    }

    #[test]
    fn test_round_tax_example() {
        // 220 * 0.22 = 48.40 exactly
        assert_eq!(round_cents(dec("220") * dec("0.22")), dec("48.40"));
    }
}
