use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------       Cents         ---------------------------------------------------------
/// A monetary amount in minor currency units (cents for most currencies).
///
/// All money in the order pipeline is integer cents. Fractional currency never enters the system, so repeated
/// reconciliation of the same order cannot accumulate rounding drift.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(unary Cents, Neg, neg);

impl Mul<i64> for Cents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {} is too large to convert to Cents", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl PartialEq for Cents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cents {}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let units = self.0 as f64 / 100.0;
        write!(f, "{units:0.2}")
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Parse a decimal money string (e.g. "123.45") into cents.
    ///
    /// Webhook payloads carry money as decimal strings. The parser is deliberately forgiving, since a missing or
    /// garbled amount must never abort reconciliation of the rest of the order:
    /// * a bare whole number is scaled to cents ("123" -> 12300),
    /// * the fractional part is truncated to two digits ("1.999" -> 199) and right-padded when shorter ("1.5" -> 150),
    /// * anything unparsable (empty, extra dots, non-numeric) yields zero.
    ///
    /// The sign is carried by the whole part, so "-1.05" -> -105.
    pub fn from_decimal_str(s: &str) -> Self {
        let parts = s.trim().split('.').collect::<Vec<&str>>();
        match parts.as_slice() {
            [whole] => whole.parse::<i64>().ok().and_then(|i| i.checked_mul(100)).map(Self).unwrap_or_default(),
            [whole, frac] => {
                let mut frac = frac.to_string();
                frac.truncate(2);
                while frac.len() < 2 {
                    frac.push('0');
                }
                format!("{whole}{frac}").parse::<i64>().map(Self).unwrap_or_default()
            },
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_standard_amounts() {
        assert_eq!(Cents::from_decimal_str("123.45"), Cents::from(12345));
        assert_eq!(Cents::from_decimal_str("0.99"), Cents::from(99));
        assert_eq!(Cents::from_decimal_str("10.00"), Cents::from(1000));
    }

    #[test]
    fn whole_numbers_scale_to_cents() {
        assert_eq!(Cents::from_decimal_str("123"), Cents::from(12300));
        assert_eq!(Cents::from_decimal_str("0"), Cents::from(0));
    }

    #[test]
    fn short_fractions_are_padded() {
        assert_eq!(Cents::from_decimal_str("123.4"), Cents::from(12340));
        assert_eq!(Cents::from_decimal_str("1."), Cents::from(100));
        assert_eq!(Cents::from_decimal_str(".5"), Cents::from(50));
    }

    #[test]
    fn long_fractions_are_truncated() {
        assert_eq!(Cents::from_decimal_str("1.999"), Cents::from(199));
        assert_eq!(Cents::from_decimal_str("0.12999"), Cents::from(12));
    }

    #[test]
    fn negative_amounts_keep_their_sign() {
        assert_eq!(Cents::from_decimal_str("-1.05"), Cents::from(-105));
        assert_eq!(Cents::from_decimal_str("-0.50"), Cents::from(-50));
        assert_eq!(Cents::from_decimal_str("-3"), Cents::from(-300));
    }

    #[test]
    fn garbage_parses_to_zero() {
        assert_eq!(Cents::from_decimal_str(""), Cents::from(0));
        assert_eq!(Cents::from_decimal_str("abc"), Cents::from(0));
        assert_eq!(Cents::from_decimal_str("1.2.3"), Cents::from(0));
        assert_eq!(Cents::from_decimal_str("12a.45"), Cents::from(0));
    }

    #[test]
    fn arithmetic_on_cents() {
        let subtotal = Cents::from(10_000);
        let shipping = Cents::from(1_500);
        let discount = Cents::from(500);
        assert_eq!(subtotal + shipping - discount, Cents::from(11_000));
        assert_eq!(-discount, Cents::from(-500));
        assert_eq!(Cents::from(250) * 4, Cents::from(1_000));
        let total: Cents = vec![subtotal, shipping, -discount].into_iter().sum();
        assert_eq!(total, Cents::from(11_000));
    }

    #[test]
    fn display_formats_as_decimal() {
        assert_eq!(Cents::from(12345).to_string(), "123.45");
        assert_eq!(Cents::from(-105).to_string(), "-1.05");
    }

    #[test]
    fn u64_conversion_guards_against_overflow() {
        assert_eq!(Cents::try_from(12345u64).ok(), Some(Cents::from(12345)));
        assert!(Cents::try_from(u64::MAX).is_err());
    }
}
