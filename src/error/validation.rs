//! Request validation errors.

/// Errors raised while validating a fee estimate request.
///
/// The display string of each variant is the message returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The chain is missing or not `tron`.
    #[error("Only chain=tron is supported.")]
    UnsupportedChain,
    /// The asset is missing or not `TRX`.
    #[error("Only asset=TRX is supported.")]
    UnsupportedAsset,
    /// One of `amount`, `from` or `to` is missing or empty.
    #[error("amount, from, and to are required.")]
    MissingFields,
    /// The amount is not a positive decimal that converts exactly to SUN.
    #[error("Invalid amount format. Must be a positive number.")]
    InvalidAmount,
    /// The sender is not a TRON address.
    #[error("Invalid from address.")]
    InvalidFromAddress,
    /// The receiver is not a TRON address.
    #[error("Invalid to address.")]
    InvalidToAddress,
    /// The signature count is not an integer in `1..=10`.
    #[error("signatureCount must be an integer between 1 and 10.")]
    InvalidSignatureCount,
}
