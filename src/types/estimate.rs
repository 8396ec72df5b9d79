use crate::constants::{SUN_PER_TRX, SUPPORTED_ASSET, SUPPORTED_CHAIN};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Bandwidth part of a [`FeeEstimate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandwidthEstimate {
    /// Unused free and staked bandwidth of the sender.
    #[serde(with = "crate::serde::quantity")]
    pub available: U256,
    /// Size of the signed transaction in bytes.
    #[serde(with = "crate::serde::quantity")]
    pub used_bytes: U256,
    /// Bytes not covered by available bandwidth.
    #[serde(with = "crate::serde::quantity")]
    pub deficit_bytes: U256,
    #[serde(with = "crate::serde::quantity")]
    pub price_sun_per_byte: U256,
    /// SUN burned to pay for the deficit.
    #[serde(with = "crate::serde::quantity")]
    pub burn_sun: U256,
}

/// The result of a fee estimate, as returned by `POST /api/estimate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimate {
    pub chain: String,
    pub asset: String,
    /// The requested amount, as sent.
    pub amount: String,
    /// The requested amount in SUN.
    #[serde(with = "crate::serde::quantity")]
    pub amount_sun: U256,
    pub from: String,
    pub to: String,
    pub bandwidth: BandwidthEstimate,
    /// Fee for activating the receiver, zero if it already exists.
    #[serde(with = "crate::serde::quantity")]
    pub create_account_fee_sun: U256,
    #[serde(with = "crate::serde::quantity")]
    pub total_fee_sun: U256,
    /// [`Self::total_fee_sun`] in TRX. For display only.
    pub total_fee_trx: f64,
}

impl FeeEstimate {
    /// Assembles an estimate, deriving the totals from the bandwidth burn and account fee.
    pub fn new(
        amount: String,
        amount_sun: u64,
        from: String,
        to: String,
        bandwidth: BandwidthEstimate,
        create_account_fee_sun: U256,
    ) -> Self {
        let total_fee_sun = bandwidth.burn_sun.saturating_add(create_account_fee_sun);
        Self {
            chain: SUPPORTED_CHAIN.to_string(),
            asset: SUPPORTED_ASSET.to_string(),
            amount,
            amount_sun: U256::from(amount_sun),
            from,
            to,
            bandwidth,
            create_account_fee_sun,
            total_fee_sun,
            total_fee_trx: sun_to_trx(total_fee_sun),
        }
    }
}

/// Converts SUN to TRX as a float. Precision loss is only acceptable for display.
pub fn sun_to_trx(sun: U256) -> f64 {
    let sun: f64 = sun.to_string().parse().unwrap_or(f64::INFINITY);
    sun / SUN_PER_TRX as f64
}
