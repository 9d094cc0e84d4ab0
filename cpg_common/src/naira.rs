use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const NGN_CURRENCY_CODE: &str = "NGN";
pub const NGN_CURRENCY_CODE_LOWER: &str = "ngn";

const KOBO_PER_NAIRA: i64 = 100;

//--------------------------------------       Naira        ---------------------------------------------------------
/// An amount of money in kobo, the minor unit of the Nigerian naira (₦1 = 100 kobo).
///
/// All amounts in the system, including the ones handed to the payment gateway, are integer kobo. This keeps order
/// totals exact; fractional-naira artifacts cannot creep in through repeated arithmetic.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Naira(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in kobo: {0}")]
pub struct NairaConversionError(String);

impl Naira {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Converts a whole-naira amount to kobo.
    pub fn from_naira(naira: i64) -> Self {
        Self(naira * KOBO_PER_NAIRA)
    }
}

impl From<i64> for Naira {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Naira {
    type Error = NairaConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(NairaConversionError(format!("Value {} is too large to convert to Naira", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl PartialEq for Naira {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Naira {}

impl Add for Naira {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Naira {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Naira {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Naira {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<i64> for Naira {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Naira {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Display for Naira {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let naira = self.0 / KOBO_PER_NAIRA;
        let kobo = (self.0 % KOBO_PER_NAIRA).abs();
        write!(f, "₦{naira}.{kobo:02}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn naira_conversion() {
        assert_eq!(Naira::from_naira(50).value(), 5_000);
        assert_eq!(Naira::from(1_234).value(), 1_234);
    }

    #[test]
    fn naira_arithmetic() {
        let subtotal = Naira::from_naira(50) * 2;
        assert_eq!(subtotal, Naira::from_naira(100));
        let total: Naira = [subtotal, Naira::from(50)].into_iter().sum();
        assert_eq!(total.value(), 10_050);
        assert_eq!(total - Naira::from(50), subtotal);
    }

    #[test]
    fn naira_display() {
        assert_eq!(Naira::from(10_050).to_string(), "₦100.50");
        assert_eq!(Naira::from(5).to_string(), "₦0.05");
        assert_eq!(Naira::from_naira(2_000).to_string(), "₦2000.00");
    }

    #[test]
    fn naira_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Naira::from(10_000)).unwrap();
        assert_eq!(json, "10000");
        let value: Naira = serde_json::from_str("250").unwrap();
        assert_eq!(value, Naira::from(250));
    }
}
