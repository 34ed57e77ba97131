//! Course price type with write-time numeric coercion.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PriceError {
    /// The input could not be parsed as a number.
    #[error("price is not a number: {0:?}")]
    NotNumeric(String),
    /// The input parsed as a negative number.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative course price.
///
/// Form submissions arrive with the price as a string (`"49"`); documents
/// read back from Firestore carry it as a double. `Price` accepts both and
/// always persists as a number, so a course created with `price: "49"` is
/// stored as numeric 49.
///
/// ```
/// use chalkboard_core::Price;
///
/// let from_form = Price::parse("49").unwrap();
/// let from_doc: Price = serde_json::from_value(serde_json::json!(49.0)).unwrap();
/// assert_eq!(from_form, from_doc);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Parse a price from string input (form fields).
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotNumeric` if the input is not a number, or
    /// `PriceError::Negative` if it is below zero.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount: Decimal = s
            .trim()
            .parse()
            .map_err(|_| PriceError::NotNumeric(s.to_owned()))?;
        Self::new(amount)
    }

    /// Coerce an arbitrary JSON value to a price, defaulting to zero.
    ///
    /// Used when reading documents back: malformed or missing numeric fields
    /// become zero rather than errors.
    #[must_use]
    pub fn coerce(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n
                .as_f64()
                .and_then(Decimal::from_f64_retain)
                .map_or(Self::ZERO, |d| Self::new(d).unwrap_or(Self::ZERO)),
            serde_json::Value::String(s) => Self::parse(s).unwrap_or(Self::ZERO),
            _ => Self::ZERO,
        }
    }

    /// The price as a decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The price as an `f64` for the Firestore double encoding.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Accept both a JSON number and a numeric string; forms submit
        // strings, the document store returns doubles.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => {
                let amount = Decimal::from_f64_retain(n)
                    .ok_or_else(|| serde::de::Error::custom("price is not a finite number"))?;
                Self::new(amount).map_err(serde::de::Error::custom)
            }
            Repr::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}
