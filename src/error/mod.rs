//! Fee calculator error types.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

mod upstream;
pub use upstream::UpstreamError;

mod validation;
pub use validation::ValidationError;

/// Message returned in place of any gateway failure.
pub const ESTIMATE_FAILED_MESSAGE: &str =
    "Failed to estimate fee. Please check your inputs and try again.";

/// Message returned when the request body is not JSON.
pub const INVALID_BODY_MESSAGE: &str = "Invalid JSON body.";

/// Message returned when the request body exceeds the configured limit.
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body too large.";

/// Message returned for unexpected failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

/// The overarching error type returned by the estimator and the HTTP API.
#[derive(Debug, Error)]
pub enum EstimateError {
    /// The request failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Reading chain state failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// The request body could not be parsed.
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    /// The request body exceeds `server.max_body_bytes`.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge {
        /// The configured limit.
        limit: usize,
    },
    /// An internal error occurred.
    #[error(transparent)]
    Internal(#[from] eyre::Error),
}

impl EstimateError {
    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Upstream(_) | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to callers. Upstream and internal details are never included.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Upstream(_) => ESTIMATE_FAILED_MESSAGE.to_string(),
            Self::InvalidBody(_) => INVALID_BODY_MESSAGE.to_string(),
            Self::BodyTooLarge { .. } => BODY_TOO_LARGE_MESSAGE.to_string(),
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable reason.
    pub error: String,
}

impl ErrorBody {
    /// Creates a new error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl IntoResponse for EstimateError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            error!(?err, "Unexpected error");
        }
        (self.status(), ErrorBody::new(self.public_message())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_messages_hide_details() {
        let err = EstimateError::from(UpstreamError::Gateway {
            path: "/wallet/createtransaction",
            message: "contract validate error : Validate TransferContract error".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), ESTIMATE_FAILED_MESSAGE);

        let err = EstimateError::from(eyre::eyre!("task panicked"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);

        let err = EstimateError::InvalidBody("expected value at line 1 column 1".into());
        assert_eq!(err.public_message(), INVALID_BODY_MESSAGE);

        let err = EstimateError::BodyTooLarge { limit: 16 * 1024 };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.public_message(), BODY_TOO_LARGE_MESSAGE);
    }

    #[test]
    fn validation_messages_are_public() {
        let err = EstimateError::from(ValidationError::InvalidToAddress);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Invalid to address.");
    }
}
