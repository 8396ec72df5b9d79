//! TRX amounts and their SUN conversion.

use crate::constants::{SUN_PER_TRX, TRX_DECIMALS};
use rust_decimal::{Decimal, prelude::ToPrimitive};

/// Whether `amount` is shaped like `digits[.digits]` (a trailing dot is allowed).
pub fn is_amount_format(amount: &str) -> bool {
    let (integer, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    !integer.is_empty()
        && integer.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

/// Converts a decimal TRX amount into SUN without going through floating point.
///
/// Returns `None` if the string is not a plain decimal, carries more precision than SUN can
/// represent, or does not fit the signed 64-bit amount of a transfer contract.
pub fn to_sun(amount: &str) -> Option<u64> {
    if !is_amount_format(amount) {
        return None;
    }

    let amount = Decimal::from_str_exact(amount.trim_end_matches('.')).ok()?;
    if amount.normalize().scale() > TRX_DECIMALS {
        return None;
    }

    let sun = amount.checked_mul(Decimal::from(SUN_PER_TRX))?;
    let sun = sun.to_u64()?;
    (sun <= i64::MAX as u64).then_some(sun)
}
