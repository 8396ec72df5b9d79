//! Chain state as reported by the gateway.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Bandwidth counters of an account, from `/wallet/getaccountresource`.
///
/// The gateway omits counters that are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResources {
    /// Daily free bandwidth allowance.
    #[serde(rename = "freeNetLimit", default, with = "crate::serde::quantity")]
    pub free_net_limit: U256,
    /// Free bandwidth consumed in the current window.
    #[serde(rename = "freeNetUsed", default, with = "crate::serde::quantity")]
    pub free_net_used: U256,
    /// Bandwidth obtained by staking.
    #[serde(rename = "NetLimit", default, with = "crate::serde::quantity")]
    pub net_limit: U256,
    /// Staked bandwidth consumed in the current window.
    #[serde(rename = "NetUsed", default, with = "crate::serde::quantity")]
    pub net_used: U256,
}

impl AccountResources {
    /// Free plus staked bandwidth that is still unused. Each part saturates at zero and the sum
    /// at [`U256::MAX`].
    pub fn available_bandwidth(&self) -> U256 {
        self.free_net_limit
            .saturating_sub(self.free_net_used)
            .saturating_add(self.net_limit.saturating_sub(self.net_used))
    }
}

/// A single chain parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParameter {
    /// Parameter name, e.g. `getTransactionFee`.
    pub key: String,
    /// Parameter value. The gateway omits zero values.
    #[serde(default, with = "crate::serde::quantity")]
    pub value: U256,
}

/// The ordered chain parameters, from `/wallet/getchainparameters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParameters {
    #[serde(rename = "chainParameter", default)]
    pub parameters: Vec<ChainParameter>,
}

impl ChainParameters {
    /// Value of the first parameter named `key`.
    pub fn get(&self, key: &str) -> Option<U256> {
        self.parameters.iter().find(|param| param.key == key).map(|param| param.value)
    }
}

impl FromIterator<(String, U256)> for ChainParameters {
    fn from_iter<T: IntoIterator<Item = (String, U256)>>(iter: T) -> Self {
        Self {
            parameters: iter
                .into_iter()
                .map(|(key, value)| ChainParameter { key, value })
                .collect(),
        }
    }
}

/// The subset of `/wallet/getaccount` that tells whether an account exists.
///
/// Unknown accounts come back as an empty object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(
        default,
        with = "crate::serde::quantity::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub create_time: Option<U256>,
}

impl AccountInfo {
    /// Whether the account is on chain: it carries a non-empty address or a non-zero create time.
    pub fn exists(&self) -> bool {
        self.address.as_deref().is_some_and(|address| !address.is_empty())
            || self.create_time.is_some_and(|time| !time.is_zero())
    }
}

/// An unsigned transaction built by the gateway, from `/wallet/createtransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    #[serde(rename = "txID", default)]
    pub tx_id: String,
    /// Hex encoded protobuf of the raw transaction.
    #[serde(default)]
    pub raw_data_hex: String,
}

impl UnsignedTransaction {
    /// Serialized size of the raw transaction in bytes.
    pub fn raw_size(&self) -> u64 {
        let hex = self.raw_data_hex.strip_prefix("0x").unwrap_or(&self.raw_data_hex);
        hex.len().div_ceil(2) as u64
    }
}

/// Everything the fee calculator reads from the chain for one estimate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSnapshot {
    /// Bandwidth counters of the sender.
    pub resources: AccountResources,
    /// Current chain parameters.
    pub parameters: ChainParameters,
    /// The receiver account.
    pub destination: AccountInfo,
    /// The representative unsigned transfer.
    pub transaction: UnsignedTransaction,
}
