//! TRON account addresses.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// First byte of every TRON mainnet address payload.
pub const ADDRESS_PREFIX: u8 = 0x41;
/// Length of the raw address payload (prefix + 20 byte account id).
pub const ADDRESS_BYTES_LEN: usize = 21;
/// Length of a base58check encoded address.
pub const ADDRESS_BASE58_LEN: usize = 34;
/// Length of a hex encoded address without `0x` prefix.
pub const ADDRESS_HEX_LEN: usize = 42;

/// Error returned when a string is not a well-formed TRON address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Base58check decoding failed (bad alphabet or checksum).
    #[error("invalid base58check address: {0}")]
    Base58(String),
    /// Hex decoding failed.
    #[error("invalid hex address: {0}")]
    Hex(String),
    /// The payload is not 21 bytes starting with `0x41`.
    #[error("address payload must be 21 bytes starting with 0x41")]
    Payload,
    /// The string is neither base58 nor hex shaped.
    #[error("address must be base58 (34 chars starting with 'T') or hex (42 chars, '41' prefix)")]
    Format,
}

/// A TRON address: `0x41` followed by the 20 byte account id.
///
/// Parses from the base58check form users see (`T...`) or from hex (`41...`, optionally
/// `0x`-prefixed). Displays as base58check.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TronAddress([u8; ADDRESS_BYTES_LEN]);

impl TronAddress {
    /// Construct from a raw 21 byte payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let inner: [u8; ADDRESS_BYTES_LEN] =
            bytes.try_into().map_err(|_| AddressError::Payload)?;
        if inner[0] != ADDRESS_PREFIX {
            return Err(AddressError::Payload);
        }
        Ok(Self(inner))
    }

    /// Construct from a base58check string.
    pub fn from_base58(s: &str) -> Result<Self, AddressError> {
        let data = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|err| AddressError::Base58(err.to_string()))?;
        Self::from_bytes(&data)
    }

    /// Construct from a hex string, with or without `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let data =
            alloy_primitives::hex::decode(s).map_err(|err| AddressError::Hex(err.to_string()))?;
        Self::from_bytes(&data)
    }

    /// Base58check representation, as accepted by the gateway with `visible: true`.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }

    /// Lowercase hex representation without `0x` prefix.
    pub fn to_hex(&self) -> String {
        alloy_primitives::hex::encode(self.0)
    }
}

impl FromStr for TronAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == ADDRESS_BASE58_LEN && s.starts_with('T') {
            return Self::from_base58(s);
        }

        let hex = s.strip_prefix("0x").unwrap_or(s);
        if hex.len() == ADDRESS_HEX_LEN && hex.starts_with("41") {
            return Self::from_hex(hex);
        }

        Err(AddressError::Format)
    }
}

impl fmt::Display for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TronAddress({} / {})", self.to_base58(), self.to_hex())
    }
}

impl Serialize for TronAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TronAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
