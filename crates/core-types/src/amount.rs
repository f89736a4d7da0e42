use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Token amount in base units (for a 6-decimal stablecoin, 1_000_000 == $1).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Amount(pub u128);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must be a non-negative integer in base units: {0}")]
    Invalid(String),
}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountParseError::Empty);
        }
        trimmed
            .replace('_', "")
            .parse::<u128>()
            .map(Amount)
            .map_err(|_| AmountParseError::Invalid(trimmed.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "serde-full")]
mod serde_impl {
    use super::Amount;
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    impl Serialize for Amount {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.0.to_string())
        }
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or decimal string in base units")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(Amount(v as u128))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
            Ok(Amount(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            u128::try_from(v)
                .map(Amount)
                .map_err(|_| E::custom(format!("negative amount: {v}")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
            Err(E::custom(format!(
                "fractional or oversized amount {v}; send base units as a decimal string"
            )))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            v.parse().map_err(E::custom)
        }
    }

    impl<'de> Deserialize<'de> for Amount {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
            deserializer.deserialize_any(AmountVisitor)
        }
    }
}
