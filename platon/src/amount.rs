//! Money amounts in the gateway's `XXXX.XX` wire format.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::params::ParamValue;

/// A non-negative amount with two decimal places.
///
/// Inputs with more precision are rounded half away from zero. The wire form
/// has exactly two decimals, no leading zeros and no thousands separators:
///
/// ```
/// use platon::amount::Amount;
///
/// assert_eq!(Amount::try_from(1_u32).unwrap().to_string(), "1.00");
/// assert_eq!(Amount::try_from(15.5_f64).unwrap().to_string(), "15.50");
/// assert_eq!("0".parse::<Amount>().unwrap().to_string(), "0.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount, rounding to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativeAmount`] for values below zero.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ValidationError::NegativeAmount(value.to_string()));
        }
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_zero() {
            return Ok(Self::ZERO);
        }
        Ok(Self(rounded))
    }

    /// Creates an amount from minor units (cents).
    #[must_use]
    pub fn from_minor_units(minor: u64) -> Self {
        Self(Decimal::from(minor) / Decimal::ONE_HUNDRED)
    }

    /// Returns the rounded decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Renders the wire form.
    #[must_use]
    pub fn to_wire(&self) -> String {
        format!("{:.2}", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<f64> for Amount {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let decimal =
            Decimal::try_from(value).map_err(|_| ValidationError::InvalidAmount(value.to_string()))?;
        Self::new(decimal)
    }
}

impl TryFrom<i64> for Amount {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(Decimal::from(value))
    }
}

impl TryFrom<u32> for Amount {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(Decimal::from(value))
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s.trim()).map_err(|_| ValidationError::InvalidAmount(s.to_owned()))?;
        Self::new(decimal)
    }
}

impl From<Amount> for ParamValue {
    fn from(amount: Amount) -> Self {
        Self::Text(amount.to_wire())
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Self::try_from(n).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", "1.00")]
    #[case("15.5", "15.50")]
    #[case("0", "0.00")]
    #[case("0.5", "0.50")]
    #[case("007.10", "7.10")]
    #[case("1234567.891", "1234567.89")]
    #[case("2.345", "2.35")]
    #[case("2.344", "2.34")]
    #[case("0.004", "0.00")]
    fn test_wire_format(#[case] input: &str, #[case] expected: &str) {
        let amount: Amount = input.parse().unwrap();
        assert_eq!(amount.to_wire(), expected);
    }

    #[test]
    fn test_from_numbers() {
        assert_eq!(Amount::try_from(1_u32).unwrap().to_wire(), "1.00");
        assert_eq!(Amount::try_from(15.5_f64).unwrap().to_wire(), "15.50");
        assert_eq!(Amount::try_from(0_i64).unwrap().to_wire(), "0.00");
        assert_eq!(Amount::from_minor_units(1999).to_wire(), "19.99");
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Amount::try_from(-1_i64),
            Err(ValidationError::NegativeAmount(_))
        ));
        assert!(matches!(
            "-0.01".parse::<Amount>(),
            Err(ValidationError::NegativeAmount(_))
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            Amount::try_from(f64::NAN),
            Err(ValidationError::InvalidAmount(_))
        ));
        assert!("12,50".parse::<Amount>().is_err());
    }

    #[test]
    fn test_serde_as_wire_string() {
        let amount = Amount::try_from(3_u32).unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"3.00\"");
        let back: Amount = serde_json::from_str("\"3.00\"").unwrap();
        assert_eq!(back, amount);
        let number: Amount = serde_json::from_str("1.5").unwrap();
        assert_eq!(number.to_wire(), "1.50");
    }

    proptest! {
        #[test]
        fn prop_wire_shape(cents in 0_u64..10_000_000_000) {
            let wire = Amount::from_minor_units(cents).to_wire();
            let (int_part, frac_part) = wire.split_once('.').unwrap();
            prop_assert_eq!(frac_part.len(), 2);
            prop_assert!(int_part == "0" || !int_part.starts_with('0'));
            prop_assert!(int_part.chars().all(|c| c.is_ascii_digit()));
            prop_assert_eq!(wire.parse::<Amount>().unwrap(), Amount::from_minor_units(cents));
        }
    }
}
