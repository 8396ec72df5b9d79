use super::TronAddress;
use serde::{Deserialize, Serialize};

/// A fee estimate request that passed validation.
///
/// Produced by [`crate::estimator::validate_request`]; every field is already constrained, so the
/// estimator never re-checks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateRequest {
    /// The amount as sent by the caller, echoed back in the estimate.
    pub amount: String,
    /// The amount in SUN.
    pub amount_sun: u64,
    /// Sender address as sent by the caller.
    pub from: String,
    /// Parsed sender address.
    pub from_address: TronAddress,
    /// Receiver address as sent by the caller.
    pub to: String,
    /// Parsed receiver address.
    pub to_address: TronAddress,
    /// Number of signatures the signed transaction will carry.
    pub signature_count: u64,
}

/// The wire shape of `POST /api/estimate`, used by adapters that build requests themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatePayload {
    /// Chain identifier, `tron`.
    pub chain: String,
    /// Asset identifier, `TRX`.
    pub asset: String,
    /// Decimal TRX amount.
    pub amount: String,
    /// Sender address.
    pub from: String,
    /// Receiver address.
    pub to: String,
    /// Expected number of signatures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_count: Option<u64>,
}
