//! Fee arithmetic.
//!
//! All quantities are 256-bit unsigned integers. Subtractions saturate at zero.

use crate::{
    constants::{
        CREATE_ACCOUNT_FEE_PARAM, CREATE_NEW_ACCOUNT_FEE_PARAM, DEFAULT_BANDWIDTH_PRICE,
        SIGNATURE_SIZE_BYTES, TRANSACTION_FEE_PARAM,
    },
    types::{BandwidthEstimate, ChainParameters, ChainSnapshot, EstimateRequest, FeeEstimate},
};
use alloy_primitives::U256;

/// Size of the signed transaction: the raw transaction plus one signature per signer.
pub fn transaction_size(raw_size: u64, signature_count: u64) -> U256 {
    U256::from(raw_size) + U256::from(SIGNATURE_SIZE_BYTES) * U256::from(signature_count)
}

/// Bandwidth price in SUN per byte, `getTransactionFee` or 1000.
pub fn bandwidth_price(params: &ChainParameters) -> U256 {
    params.get(TRANSACTION_FEE_PARAM).unwrap_or(U256::from(DEFAULT_BANDWIDTH_PRICE))
}

/// Account creation fee in SUN, `getCreateNewAccountFeeInSystemContract`, else
/// `getCreateAccountFee`, else zero.
pub fn create_account_fee(params: &ChainParameters) -> U256 {
    params
        .get(CREATE_NEW_ACCOUNT_FEE_PARAM)
        .or_else(|| params.get(CREATE_ACCOUNT_FEE_PARAM))
        .unwrap_or_default()
}

/// Computes the fee of `request` against `snapshot`.
pub fn calculate_fee(request: &EstimateRequest, snapshot: &ChainSnapshot) -> FeeEstimate {
    let price = bandwidth_price(&snapshot.parameters);
    let used_bytes = transaction_size(snapshot.transaction.raw_size(), request.signature_count);
    let available = snapshot.resources.available_bandwidth();
    let deficit_bytes = used_bytes.saturating_sub(available);
    let burn_sun = deficit_bytes.saturating_mul(price);

    let create_account_fee_sun = if snapshot.destination.exists() {
        U256::ZERO
    } else {
        create_account_fee(&snapshot.parameters)
    };

    FeeEstimate::new(
        request.amount.clone(),
        request.amount_sun,
        request.from.clone(),
        request.to.clone(),
        BandwidthEstimate {
            available,
            used_bytes,
            deficit_bytes,
            price_sun_per_byte: price,
            burn_sun,
        },
        create_account_fee_sun,
    )
}
