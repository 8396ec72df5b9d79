//! Per-client rate limiting over fixed minute and hour windows.
//!
//! Windows are aligned to the wall clock (`floor(now / window)`), so a client may burst at a
//! window boundary. Counters of past windows are dropped by [`RateLimiter::prune`].

use crate::{
    constants::{DEFAULT_RATE_LIMIT_PER_HOUR, DEFAULT_RATE_LIMIT_PER_MINUTE},
    error::ErrorBody,
};
use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde::Serialize;
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
const CF_CONNECTING_IP: HeaderName = HeaderName::from_static("cf-connecting-ip");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// A rate limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Minute,
    Hour,
}

impl Window {
    /// Window length in milliseconds.
    pub const fn millis(self) -> u64 {
        match self {
            Self::Minute => 60_000,
            Self::Hour => 3_600_000,
        }
    }

    /// Index of the window containing `now_ms`.
    pub const fn index(self, now_ms: u64) -> u64 {
        now_ms / self.millis()
    }

    /// Unix timestamp in seconds at which the window containing `now_ms` ends.
    pub const fn reset_at(self, now_ms: u64) -> u64 {
        (self.index(now_ms) + 1) * self.millis() / 1000
    }
}

/// The state of a client's quota, as reported in `X-RateLimit-*` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp in seconds.
    pub reset: u64,
}

impl RateLimitStatus {
    /// Writes the `X-RateLimit-*` headers.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(X_RATELIMIT_RESET, HeaderValue::from(self.reset));
    }
}

/// A request over quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRejection {
    /// The exhausted window.
    pub window: Window,
    /// Quota of the exhausted window, with nothing remaining.
    pub status: RateLimitStatus,
    /// Seconds until the window resets.
    pub retry_after: u64,
}

impl RateLimitRejection {
    fn message(&self) -> String {
        match self.window {
            Window::Minute => format!(
                "Maximum {} requests per minute exceeded. Please try again in {} seconds.",
                self.status.limit, self.retry_after
            ),
            Window::Hour => format!(
                "Maximum {} requests per hour exceeded. Please try again in {} minutes.",
                self.status.limit,
                self.retry_after.div_ceil(60)
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct RateLimitBody {
    #[serde(flatten)]
    error: ErrorBody,
    message: String,
}

impl IntoResponse for RateLimitRejection {
    fn into_response(self) -> Response {
        let body =
            RateLimitBody { error: ErrorBody::new("Rate limit exceeded"), message: self.message() };

        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        let headers = response.headers_mut();
        self.status.apply(headers);
        headers.insert(header::RETRY_AFTER, HeaderValue::from(self.retry_after));
        response
    }
}

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The request is within quota. Carries the tighter of the two windows.
    Allowed(RateLimitStatus),
    /// The request is over quota.
    Limited(RateLimitRejection),
}

/// Counts requests per client in minute and hour windows.
#[derive(Debug)]
pub struct RateLimiter {
    per_minute: u32,
    per_hour: u32,
    trust_proxy_headers: bool,
    minute: DashMap<(String, u64), u32>,
    hour: DashMap<(String, u64), u32>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT_PER_MINUTE, DEFAULT_RATE_LIMIT_PER_HOUR)
    }
}

impl RateLimiter {
    /// Create a new rate limiter.
    pub fn new(per_minute: u32, per_hour: u32) -> Self {
        Self {
            per_minute,
            per_hour,
            trust_proxy_headers: false,
            minute: DashMap::new(),
            hour: DashMap::new(),
        }
    }

    /// Identify clients by `CF-Connecting-IP` / `X-Forwarded-For` instead of the peer address.
    ///
    /// Only enable this behind a proxy that sets these headers, otherwise clients choose their
    /// own key.
    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// The key identifying the client of a request.
    pub fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        client_key(headers, peer, self.trust_proxy_headers)
    }

    /// Counts a request by `client` at `now_ms` (unix milliseconds).
    ///
    /// The minute window is checked first. A rejected check does not count against its window.
    pub fn check(&self, client: &str, now_ms: u64) -> RateLimitDecision {
        let Some(minute_count) =
            Self::increment(&self.minute, client, Window::Minute, now_ms, self.per_minute)
        else {
            return RateLimitDecision::Limited(rejection(Window::Minute, self.per_minute, now_ms));
        };

        let Some(hour_count) =
            Self::increment(&self.hour, client, Window::Hour, now_ms, self.per_hour)
        else {
            return RateLimitDecision::Limited(rejection(Window::Hour, self.per_hour, now_ms));
        };

        let minute_remaining = self.per_minute.saturating_sub(minute_count);
        let hour_remaining = self.per_hour.saturating_sub(hour_count);

        // hour_remaining / per_hour < minute_remaining / per_minute
        let hour_is_tighter = u64::from(hour_remaining) * u64::from(self.per_minute)
            < u64::from(minute_remaining) * u64::from(self.per_hour);

        RateLimitDecision::Allowed(if hour_is_tighter {
            RateLimitStatus {
                limit: self.per_hour,
                remaining: hour_remaining,
                reset: Window::Hour.reset_at(now_ms),
            }
        } else {
            RateLimitStatus {
                limit: self.per_minute,
                remaining: minute_remaining,
                reset: Window::Minute.reset_at(now_ms),
            }
        })
    }

    /// Returns the new count, or `None` without counting if it would exceed `limit`.
    fn increment(
        counters: &DashMap<(String, u64), u32>,
        client: &str,
        window: Window,
        now_ms: u64,
        limit: u32,
    ) -> Option<u32> {
        let mut count = counters.entry((client.to_string(), window.index(now_ms))).or_insert(0);
        let next = count.saturating_add(1);
        if next > limit {
            return None;
        }
        *count = next;
        Some(next)
    }

    /// Drops counters of windows that ended before `now_ms`.
    pub fn prune(&self, now_ms: u64) {
        let minute = Window::Minute.index(now_ms);
        let hour = Window::Hour.index(now_ms);
        self.minute.retain(|(_, window), _| *window >= minute);
        self.hour.retain(|(_, window), _| *window >= hour);
    }

    /// Number of tracked (client, window) counters.
    pub fn tracked_counters(&self) -> usize {
        self.minute.len() + self.hour.len()
    }

    /// Spawns a task pruning stale counters every `interval`.
    pub fn spawn_pruner(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            loop {
                interval.tick().await;
                self.prune(now_ms());
                debug!(counters = self.tracked_counters(), "Pruned rate limit counters");
            }
        })
    }
}

fn rejection(window: Window, limit: u32, now_ms: u64) -> RateLimitRejection {
    let reset = window.reset_at(now_ms);
    RateLimitRejection {
        window,
        status: RateLimitStatus { limit, remaining: 0, reset },
        retry_after: (reset * 1000).saturating_sub(now_ms).div_ceil(1000),
    }
}

/// Current unix time in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or_default()
}

/// Identifies the client by its peer address.
///
/// With `trust_proxy_headers`, `CF-Connecting-IP` and then the first `X-Forwarded-For` entry take
/// precedence over the peer address.
pub fn client_key(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    let header = |name: &HeaderName| {
        headers.get(name).and_then(|value| value.to_str().ok()).map(str::trim)
    };

    let forwarded = || {
        header(&CF_CONNECTING_IP).filter(|ip| !ip.is_empty()).or_else(|| {
            header(&X_FORWARDED_FOR)
                .and_then(|list| list.split(',').next())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
    };

    trust_proxy_headers
        .then(forwarded)
        .flatten()
        .map(str::to_string)
        .or_else(|| peer.map(|peer| peer.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limits requests under `/api/`.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().starts_with("/api/") {
        return next.run(request).await;
    }

    let peer = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0);
    let client = limiter.client_key(request.headers(), peer);

    match limiter.check(&client, now_ms()) {
        RateLimitDecision::Limited(rejection) => {
            warn!(%client, window = ?rejection.window, "Rate limit exceeded");
            rejection.into_response()
        }
        RateLimitDecision::Allowed(status) => {
            let mut response = next.run(request).await;
            status.apply(response.headers_mut());
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2024-01-01T00:00:00Z, aligned to both windows.
    const T0: u64 = 1_704_067_200_000;

    #[test]
    fn minute_window_limits_and_resets() {
        let limiter = RateLimiter::new(10, 100);

        for i in 1..=10u32 {
            let RateLimitDecision::Allowed(status) = limiter.check("1.2.3.4", T0 + 1_000) else {
                panic!("request {i} should be allowed");
            };
            assert_eq!(status.limit, 10);
            assert_eq!(status.remaining, 10 - i);
            assert_eq!(status.reset, T0 / 1000 + 60);
        }

        let RateLimitDecision::Limited(rejection) = limiter.check("1.2.3.4", T0 + 15_500) else {
            panic!("11th request should be limited");
        };
        assert_eq!(rejection.window, Window::Minute);
        assert_eq!(
            rejection.status,
            RateLimitStatus { limit: 10, remaining: 0, reset: T0 / 1000 + 60 }
        );
        assert_eq!(rejection.retry_after, 45);
        assert_eq!(
            rejection.message(),
            "Maximum 10 requests per minute exceeded. Please try again in 45 seconds."
        );

        // other clients are unaffected
        assert!(matches!(limiter.check("5.6.7.8", T0 + 16_000), RateLimitDecision::Allowed(_)));

        // next minute
        assert!(matches!(limiter.check("1.2.3.4", T0 + 60_000), RateLimitDecision::Allowed(_)));
    }

    #[test]
    fn hour_window_limits() {
        let limiter = RateLimiter::new(10, 25);

        for minute in 0..3 {
            for _ in 0..10 {
                let now = T0 + minute * 60_000;
                if let RateLimitDecision::Limited(rejection) = limiter.check("client", now) {
                    assert_eq!(minute, 2);
                    assert_eq!(rejection.window, Window::Hour);
                    assert_eq!(rejection.status.reset, T0 / 1000 + 3600);
                    assert_eq!(rejection.retry_after, 3600 - 120);
                    assert_eq!(
                        rejection.message(),
                        "Maximum 25 requests per hour exceeded. Please try again in 58 minutes."
                    );
                }
            }
        }

        // the hour counter stopped at its limit
        let key = ("client".to_string(), Window::Hour.index(T0));
        assert_eq!(*limiter.hour.get(&key).unwrap(), 25);
    }

    #[test]
    fn reports_the_tighter_window() {
        let limiter = RateLimiter::new(10, 12);

        // first request: minute 9/10 remaining, hour 11/12 remaining -> minute is tighter
        let RateLimitDecision::Allowed(status) = limiter.check("c", T0) else { panic!() };
        assert_eq!(status, RateLimitStatus { limit: 10, remaining: 9, reset: T0 / 1000 + 60 });

        for _ in 0..9 {
            limiter.check("c", T0);
        }

        // next minute: minute 9/10 remaining, hour 1/12 remaining -> hour is tighter
        let RateLimitDecision::Allowed(status) = limiter.check("c", T0 + 60_000) else { panic!() };
        assert_eq!(status, RateLimitStatus { limit: 12, remaining: 1, reset: T0 / 1000 + 3600 });
    }

    #[test]
    fn equal_ratios_report_the_minute_window() {
        let limiter = RateLimiter::new(10, 100);
        // minute 9/10, hour 99/100: minute ratio is lower
        let RateLimitDecision::Allowed(status) = limiter.check("c", T0) else { panic!() };
        assert_eq!(status.limit, 10);

        let limiter = RateLimiter::new(10, 10);
        let RateLimitDecision::Allowed(status) = limiter.check("c", T0) else { panic!() };
        assert_eq!(status.limit, 10);
        assert_eq!(status.reset, T0 / 1000 + 60);
    }

    #[test]
    fn prunes_past_windows() {
        let limiter = RateLimiter::default();
        limiter.check("a", T0);
        limiter.check("b", T0 + 30_000);
        // one minute and one hour counter per client
        assert_eq!(limiter.tracked_counters(), 4);

        limiter.prune(T0 + 59_999);
        assert_eq!(limiter.tracked_counters(), 4);

        limiter.prune(T0 + 60_000);
        assert_eq!(limiter.tracked_counters(), 2);

        limiter.prune(T0 + 3_600_000);
        assert_eq!(limiter.tracked_counters(), 0);
    }

    #[test]
    fn client_key_precedence() {
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers, None, true), "unknown");
        assert_eq!(client_key(&headers, Some(peer), true), "10.0.0.1");

        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.7, 10.0.0.2"));
        assert_eq!(client_key(&headers, Some(peer), true), "203.0.113.7");

        headers.insert(CF_CONNECTING_IP, HeaderValue::from_static("198.51.100.3"));
        assert_eq!(client_key(&headers, Some(peer), true), "198.51.100.3");
    }

    #[test]
    fn forwarded_headers_are_ignored_unless_trusted() {
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(CF_CONNECTING_IP, HeaderValue::from_static("198.51.100.3"));
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.7"));

        assert_eq!(client_key(&headers, Some(peer), false), "10.0.0.1");
        assert_eq!(client_key(&headers, None, false), "unknown");

        assert_eq!(RateLimiter::default().client_key(&headers, Some(peer)), "10.0.0.1");
        let trusting = RateLimiter::default().with_trusted_proxy_headers(true);
        assert_eq!(trusting.client_key(&headers, Some(peer)), "198.51.100.3");
    }
}
