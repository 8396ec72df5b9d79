//! Gateway errors.

use reqwest::StatusCode;

/// Errors talking to the TRON gateway.
///
/// These are logged in full and never returned to callers.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The request could not be sent or the response could not be read.
    #[error("gateway request to {path} failed: {source}")]
    Transport {
        /// Gateway path, e.g. `/wallet/getaccount`.
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The gateway did not answer within the configured timeout.
    #[error("gateway request to {path} timed out")]
    Timeout {
        /// Gateway path.
        path: &'static str,
    },
    /// The gateway answered with a non-success status.
    #[error("gateway request to {path} returned {status}: {body}")]
    Status {
        /// Gateway path.
        path: &'static str,
        /// Response status.
        status: StatusCode,
        /// Response body, truncated.
        body: String,
    },
    /// The response body did not have the expected shape.
    #[error("malformed gateway response from {path}: {source}")]
    Malformed {
        /// Gateway path.
        path: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The gateway reported an error in an otherwise successful response.
    #[error("gateway rejected request to {path}: {message}")]
    Gateway {
        /// Gateway path.
        path: &'static str,
        /// The reported error.
        message: String,
    },
}

impl UpstreamError {
    /// Maps a reqwest error, distinguishing timeouts.
    pub fn from_reqwest(path: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() { Self::Timeout { path } } else { Self::Transport { path, source } }
    }
}
