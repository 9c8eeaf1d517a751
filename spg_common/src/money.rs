use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "VND";

/// Currency codes are stored and compared trimmed and in upper case ("usd " becomes "USD").
pub fn normalize_currency_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

const MINOR_UNITS_PER_MAJOR: i64 = 100;

//--------------------------------------       Money         ---------------------------------------------------------
/// A fixed-point monetary amount with two decimal places, stored as a count of hundredths.
///
/// On the wire, `Money` is always a decimal string ("25.00"). It will also accept JSON numbers when deserializing, as
/// long as they carry no more than two decimal places.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(unary Money, Neg, neg);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyConversionError {
    #[error("'{0}' is not a valid decimal amount")]
    InvalidFormat(String),
    #[error("'{0}' has more than two decimal places")]
    TooPrecise(String),
    #[error("{0} is too large to be represented as a monetary amount")]
    Overflow(String),
}

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// A whole number of major units, e.g. `Money::from_major(10)` is 10.00. Saturates on overflow.
    pub const fn from_major(units: i64) -> Self {
        Self(units.saturating_mul(MINOR_UNITS_PER_MAJOR))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Multiplies a unit price by a quantity, returning `None` on overflow.
    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_UNITS_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per_major, abs % per_major)
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || MoneyConversionError::InvalidFormat(s.to_string());
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, frac) = match unsigned.split_once('.') {
            Some((whole, frac)) => (whole, Some(frac)),
            None => (unsigned, None),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let frac_cents = match frac {
            None => 0,
            Some(f) if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) => return Err(invalid()),
            Some(f) if f.len() > 2 => return Err(MoneyConversionError::TooPrecise(s.to_string())),
            Some(f) if f.len() == 1 => i64::from(f.as_bytes()[0] - b'0') * 10,
            Some(f) => f.parse::<i64>().map_err(|_| invalid())?,
        };
        let overflow = || MoneyConversionError::Overflow(s.to_string());
        let whole = whole.parse::<i64>().map_err(|_| overflow())?;
        let cents = whole
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(overflow)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl TryFrom<i64> for Money {
    type Error = MoneyConversionError;

    /// Converts a whole number of major units.
    fn try_from(units: i64) -> Result<Self, Self::Error> {
        units
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .map(Self)
            .ok_or_else(|| MoneyConversionError::Overflow(units.to_string()))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct MoneyVisitor;

impl<'de> de::Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount with at most two decimal places")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Money::from_str(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Money::try_from(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(MoneyConversionError::Overflow(v.to_string())))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() {
            return Err(E::custom(MoneyConversionError::InvalidFormat(v.to_string())));
        }
        // f64's Display is the shortest round-trip form, so 10.5 prints as "10.5" and 0.1 + 0.2 fails the precision check.
        Money::from_str(&v.to_string()).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}
