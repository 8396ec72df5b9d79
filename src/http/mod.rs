//! The HTTP API.
//!
//! - `GET /health`
//! - `POST /api/estimate`
//!
//! Everything else answers `404 {"error": "Not found"}`.

mod cors;
pub use cors::{CorsPolicy, cors_middleware};

mod handlers;
pub use handlers::HealthResponse;

mod rate_limit;
pub use rate_limit::{
    RateLimitDecision, RateLimitRejection, RateLimitStatus, RateLimiter, Window, client_key,
    now_ms, rate_limit_middleware,
};

use crate::{config::FeeCalcConfig, estimator::FeeEstimator, metrics::request_metrics_middleware};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// Shared state of the HTTP API.
#[derive(Debug, Clone)]
pub struct ApiState {
    /// The estimator serving `POST /api/estimate`.
    pub estimator: FeeEstimator,
    /// CORS policy applied to every response.
    pub cors: Arc<CorsPolicy>,
    /// Rate limiter for `/api/*`, if enabled.
    pub rate_limiter: Option<Arc<RateLimiter>>,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl ApiState {
    /// Builds the API state from configuration.
    pub fn new(estimator: FeeEstimator, config: &FeeCalcConfig) -> Self {
        let rate_limiter = config.rate_limit.enabled.then(|| {
            Arc::new(
                RateLimiter::new(config.rate_limit.per_minute, config.rate_limit.per_hour)
                    .with_trusted_proxy_headers(config.rate_limit.trust_proxy_headers),
            )
        });

        Self {
            estimator,
            cors: Arc::new(CorsPolicy::new(config.cors.allowed_origins.clone())),
            rate_limiter,
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}

/// Builds the API router.
pub fn router(state: ApiState) -> Router {
    let cors = state.cors.clone();
    let rate_limiter = state.rate_limiter.clone();
    let max_body_bytes = state.max_body_bytes;

    let mut router = Router::new()
        .route("/health", get(handlers::health).fallback(handlers::not_found))
        .route("/api/estimate", post(handlers::estimate).fallback(handlers::not_found))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handlers::internal_error))
        .layer(DefaultBodyLimit::max(max_body_bytes));

    if let Some(rate_limiter) = rate_limiter {
        router = router.layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));
    }

    router
        .layer(middleware::from_fn_with_state(cors, cors_middleware))
        .layer(middleware::from_fn(request_metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
