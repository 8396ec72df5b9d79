//! Lenient (de)serialization of non-negative integer quantities reported by the gateway.
//!
//! TronGrid reports resource counters and chain parameters as JSON numbers, while other gateways
//! (and our own API responses) use decimal strings. Values are held as [`U256`] so that none of the
//! fee arithmetic can overflow, and are always serialized as decimal strings.

use alloy_primitives::U256;
use serde::{
    Deserialize, Deserializer, Serializer,
    de::{self, MapAccess, Visitor, value::MapAccessDeserializer},
};
use std::{fmt, str::FromStr};

/// Serializes a [`U256`] as a decimal string.
pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(value)
}

/// Deserializes a [`U256`] from a JSON number or a decimal string.
pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(QuantityVisitor)
}

/// Same as the parent module, for optional quantities.
pub mod option {
    use super::QuantityVisitor;
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an optional [`U256`] as a decimal string or `null`.
    pub fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.collect_str(value),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional [`U256`] from a JSON number, a decimal string or `null`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(deserialize_with = "deserialize_inner")] U256);

        fn deserialize_inner<'de, D>(deserializer: D) -> Result<U256, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(QuantityVisitor)
        }

        Option::<Wrapper>::deserialize(deserializer).map(|wrapper| wrapper.map(|w| w.0))
    }
}

/// Integers up to 2^53 are exact in `f64`.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = U256;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a non-negative integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<U256, E> {
        Ok(U256::from(value))
    }

    fn visit_u128<E: de::Error>(self, value: u128) -> Result<U256, E> {
        Ok(U256::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<U256, E> {
        u64::try_from(value)
            .map(U256::from)
            .map_err(|_| E::custom(format!("negative quantity: {value}")))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<U256, E> {
        // only integral floats that f64 represents exactly, e.g. `1000.0`
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MAX_EXACT_F64 {
            Ok(U256::from(value as u64))
        } else {
            Err(E::custom(format!("not an exact non-negative integer: {value}")))
        }
    }

    // `arbitrary_precision` hands over numbers that fit no primitive as a `Number` map
    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<U256, A::Error> {
        let number = serde_json::Number::deserialize(MapAccessDeserializer::new(map))?;
        self.visit_str(&number.to_string())
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<U256, E> {
        let value = value.trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(E::custom(format!("invalid decimal quantity: {value:?}")));
        }
        U256::from_str(value).map_err(E::custom)
    }
}
