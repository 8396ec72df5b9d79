//! Request validation.
//!
//! Checks run in a fixed order and the first failure wins.

use crate::{
    constants::{DEFAULT_SIGNATURE_COUNT, MAX_SIGNATURE_COUNT, SUPPORTED_ASSET, SUPPORTED_CHAIN},
    error::ValidationError,
    types::{EstimateRequest, TronAddress, to_sun},
};
use serde_json::Value;
use std::str::FromStr;

/// Validates a raw `POST /api/estimate` payload.
///
/// Any JSON value is accepted as input; non-objects fail the chain check.
pub fn validate_request(payload: &Value) -> Result<EstimateRequest, ValidationError> {
    let chain = payload.get("chain").and_then(Value::as_str);
    if !chain.is_some_and(|chain| chain.eq_ignore_ascii_case(SUPPORTED_CHAIN)) {
        return Err(ValidationError::UnsupportedChain);
    }

    let asset = payload.get("asset").and_then(Value::as_str);
    if !asset.is_some_and(|asset| asset.eq_ignore_ascii_case(SUPPORTED_ASSET)) {
        return Err(ValidationError::UnsupportedAsset);
    }

    let (Some(amount), Some(from), Some(to)) =
        (present(payload, "amount"), present(payload, "from"), present(payload, "to"))
    else {
        return Err(ValidationError::MissingFields);
    };

    let amount_sun = to_sun(&amount)
        .filter(|sun| *sun > 0)
        .ok_or(ValidationError::InvalidAmount)?;

    let from_address =
        TronAddress::from_str(&from).map_err(|_| ValidationError::InvalidFromAddress)?;
    let to_address = TronAddress::from_str(&to).map_err(|_| ValidationError::InvalidToAddress)?;

    let signature_count = signature_count(payload.get("signatureCount"))?;

    Ok(EstimateRequest { amount, amount_sun, from, from_address, to, to_address, signature_count })
}

/// Returns the field as text, or `None` if it is absent, `null`, `false`, empty or zero.
fn present(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Parses `signatureCount`, defaulting to one when absent or `null`.
fn signature_count(value: Option<&Value>) -> Result<u64, ValidationError> {
    let count = match value {
        None | Some(Value::Null) => return Ok(DEFAULT_SIGNATURE_COUNT),
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    count
        .filter(|count| (1..=MAX_SIGNATURE_COUNT).contains(count))
        .ok_or(ValidationError::InvalidSignatureCount)
}
