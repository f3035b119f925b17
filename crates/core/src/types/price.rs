//! Decimal money amounts in the store currency.
//!
//! The storefront sells in Indian rupees only, so a price is a bare decimal
//! amount plus formatting rules. Arithmetic stays in `Decimal` to avoid the
//! rounding drift of floats when multiplying unit price by quantity.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Symbol prefixed to every displayed amount.
pub const CURRENCY_SYMBOL: &str = "₹";

/// ISO 4217 code sent to the payment widget when the API omits one.
pub const DEFAULT_CURRENCY_CODE: &str = "INR";

/// An amount of money in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Amount in paise, as the payment widget expects.
    ///
    /// Rounded to the nearest paisa; `None` if it does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(&self) -> Option<i64> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|paise| paise.round().to_i64())
    }

    /// Display form with two decimals, e.g. `₹1299.50`.
    ///
    /// Halves round to even.
    #[must_use]
    pub fn display(&self) -> String {
        let mut amount = self.0.round_dp(2);
        amount.rescale(2);
        format!("{CURRENCY_SYMBOL}{amount}")
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

/// Saturates at the decimal bounds instead of panicking.
impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

/// Saturates at the decimal bounds instead of panicking.
impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn price(s: &str) -> Price {
        Price::new(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(price("10").display(), "₹10.00");
        assert_eq!(price("1299.5").display(), "₹1299.50");
        assert_eq!(Price::ZERO.to_string(), "₹0.00");
    }

    #[test]
    fn test_display_rounds() {
        assert_eq!(price("2.005").display(), "₹2.00");
        assert_eq!(price("2.015").display(), "₹2.02");
    }

    #[test]
    fn test_multiply_by_quantity() {
        assert_eq!(price("10") * 2, price("20"));
        assert_eq!(price("5") * 1, price("5"));
    }

    #[test]
    fn test_sum() {
        let total: Price = [price("20"), price("5"), price("0.25")].into_iter().sum();
        assert_eq!(total, price("25.25"));
    }

    #[test]
    fn test_oversized_amounts_saturate() {
        let huge = price("70000000000000000000000000000");
        assert_eq!(huge * 2, Price::new(Decimal::MAX));
        assert_eq!(huge + huge, Price::new(Decimal::MAX));
        let total: Price = [huge, huge, price("1")].into_iter().sum();
        assert_eq!(total, Price::new(Decimal::MAX));
        assert!(huge.display().starts_with(CURRENCY_SYMBOL));
    }

    #[test]
    fn test_minor_units_out_of_range() {
        assert_eq!(price("70000000000000000000000000000").to_minor_units(), None);
        assert_eq!(price("100000000000000000").to_minor_units(), None);
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(price("499.99").to_minor_units(), Some(49_999));
        assert_eq!(price("0").to_minor_units(), Some(0));
    }
}
