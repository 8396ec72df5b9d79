//! CORS handling.
//!
//! Unlike a strict allow-list, origins that are not allowed are answered with the first allowed
//! origin instead of no header at all, which makes browsers reject the response.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Methods announced in `Access-Control-Allow-Methods`.
const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Headers announced in `Access-Control-Allow-Headers`.
const ALLOWED_HEADERS: &str = "Content-Type";

/// Resolves the `Access-Control-Allow-Origin` value for a request.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    /// Create a new policy. An empty list allows any origin.
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    /// The origin to answer `origin` with.
    pub fn allow_origin(&self, origin: Option<&str>) -> &str {
        let Some(first) = self.allowed_origins.first() else {
            return "*";
        };

        origin
            .and_then(|origin| self.allowed_origins.iter().find(|allowed| *allowed == origin))
            .unwrap_or(first)
            .as_str()
    }

    /// Adds the CORS headers for a request with `origin` to `headers`.
    pub fn apply(&self, origin: Option<&str>, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(self.allow_origin(origin)) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        if !self.allowed_origins.is_empty() {
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
    }
}

/// Answers preflight requests with `204` and adds CORS headers to every other response.
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    policy.apply(origin.as_deref(), response.headers_mut());
    response
}
