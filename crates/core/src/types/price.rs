//! Type-safe price representation using decimal arithmetic.
//!
//! The marketplace sells in Chilean pesos, which have no minor unit, so
//! prices display rounded to whole pesos with `.` as thousands separator.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price in Chilean pesos.
///
/// Deserializes from JSON numbers as well as numeric strings, since the
/// backend is not consistent about which one it sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of pesos.
    #[must_use]
    pub fn from_pesos(pesos: i64) -> Self {
        Self(Decimal::from(pesos))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i128()
            .unwrap_or_default();
        let digits = rounded.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        if rounded < 0 {
            write!(f, "-${grouped}")
        } else {
            write!(f, "${grouped}")
        }
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_pesos(12_990).to_string(), "$12.990");
        assert_eq!(Price::from_pesos(1_234_567).to_string(), "$1.234.567");
        assert_eq!(Price::from_pesos(990).to_string(), "$990");
        assert_eq!(Price::ZERO.to_string(), "$0");
    }

    #[test]
    fn test_display_rounds_to_whole_pesos() {
        let price = Price::new(Decimal::new(1_999_50, 2));
        assert_eq!(price.to_string(), "$2.000");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Price::from_pesos(-1_500).to_string(), "-$1.500");
    }

    #[test]
    fn test_arithmetic() {
        let unit = Price::from_pesos(4_990);
        assert_eq!(unit * 3, Price::from_pesos(14_970));
        assert_eq!(unit + unit, Price::from_pesos(9_980));

        let total: Price = [unit, Price::from_pesos(10)].into_iter().sum();
        assert_eq!(total, Price::from_pesos(5_000));
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Price = serde_json::from_str("12990").unwrap();
        let from_string: Price = serde_json::from_str("\"12990\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number, Price::from_pesos(12_990));
    }
}
