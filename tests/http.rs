//! HTTP API tests against an in-memory gateway.

use alloy_primitives::U256;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use feecalc::{
    config::FeeCalcConfig,
    error::UpstreamError,
    estimator::FeeEstimator,
    http::{ApiState, router},
    tron::TronApi,
    types::{
        AccountInfo, AccountResources, ChainParameters, ChainSnapshot, FeeEstimate, TronAddress,
        UnsignedTransaction,
    },
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceExt;

const FROM: &str = "TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL";
const TO: &str = "414444444444444444444444444444444444444444";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Ok,
    Fail,
    Panic,
}

#[derive(Debug)]
struct MockTron {
    snapshot: ChainSnapshot,
    behavior: Behavior,
}

impl MockTron {
    fn check(&self, path: &'static str) -> Result<(), UpstreamError> {
        match self.behavior {
            Behavior::Ok => Ok(()),
            Behavior::Fail => Err(UpstreamError::Gateway { path, message: "boom".into() }),
            Behavior::Panic => panic!("gateway mock panicked"),
        }
    }
}

#[async_trait]
impl TronApi for MockTron {
    async fn get_account_resources(
        &self,
        _: &TronAddress,
    ) -> Result<AccountResources, UpstreamError> {
        self.check("/wallet/getaccountresource")?;
        Ok(self.snapshot.resources.clone())
    }

    async fn get_chain_parameters(&self) -> Result<ChainParameters, UpstreamError> {
        self.check("/wallet/getchainparameters")?;
        Ok(self.snapshot.parameters.clone())
    }

    async fn get_account(&self, _: &TronAddress) -> Result<AccountInfo, UpstreamError> {
        self.check("/wallet/getaccount")?;
        Ok(self.snapshot.destination.clone())
    }

    async fn build_unsigned_transfer(
        &self,
        _: &TronAddress,
        _: u64,
        _: &TronAddress,
    ) -> Result<UnsignedTransaction, UpstreamError> {
        self.check("/wallet/createtransaction")?;
        Ok(self.snapshot.transaction.clone())
    }
}

fn snapshot() -> ChainSnapshot {
    ChainSnapshot {
        resources: AccountResources { free_net_limit: U256::from(600), ..Default::default() },
        parameters: [
            ("getTransactionFee".to_string(), U256::from(1000)),
            ("getCreateNewAccountFeeInSystemContract".to_string(), U256::from(1_000_000)),
        ]
        .into_iter()
        .collect(),
        destination: AccountInfo { address: Some(TO.into()), create_time: None },
        // 203 raw bytes, 268 once signed
        transaction: UnsignedTransaction { tx_id: "ab".into(), raw_data_hex: "0a".repeat(203) },
    }
}

fn app_with(config: &FeeCalcConfig, snapshot: ChainSnapshot, behavior: Behavior) -> Router {
    let estimator = FeeEstimator::new(Arc::new(MockTron { snapshot, behavior }));
    router(ApiState::new(estimator, config))
}

fn app(behavior: Behavior) -> Router {
    app_with(&FeeCalcConfig::default(), snapshot(), behavior)
}

fn estimate_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/estimate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn payload() -> Value {
    json!({ "chain": "tron", "asset": "TRX", "amount": "100", "from": FROM, "to": TO })
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health() {
    let response = app(Behavior::Ok)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    // only /api/* is rate limited
    assert!(response.headers().get("x-ratelimit-limit").is_none());
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn estimate_with_free_bandwidth() {
    let response =
        app(Behavior::Ok).oneshot(estimate_request(payload().to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-limit"], "10");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "9");
    assert!(response.headers().contains_key("x-ratelimit-reset"));

    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({
            "chain": "tron",
            "asset": "TRX",
            "amount": "100",
            "amountSun": "100000000",
            "from": FROM,
            "to": TO,
            "bandwidth": {
                "available": "600",
                "usedBytes": "268",
                "deficitBytes": "0",
                "priceSunPerByte": "1000",
                "burnSun": "0"
            },
            "createAccountFeeSun": "0",
            "totalFeeSun": "0",
            "totalFeeTrx": 0.0
        })
    );
}

#[tokio::test]
async fn estimate_new_account_without_bandwidth() {
    let snapshot = ChainSnapshot {
        resources: AccountResources::default(),
        destination: AccountInfo::default(),
        ..snapshot()
    };
    let response = app_with(&FeeCalcConfig::default(), snapshot, Behavior::Ok)
        .oneshot(estimate_request(payload().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let estimate: FeeEstimate = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(estimate.bandwidth.burn_sun, U256::from(268_000));
    assert_eq!(estimate.create_account_fee_sun, U256::from(1_000_000));
    assert_eq!(estimate.total_fee_sun, U256::from(1_268_000));
    assert_eq!(estimate.total_fee_trx, 1.268);
}

#[tokio::test]
async fn validation_errors() {
    let cases = [
        (json!({ "chain": "ethereum" }), "Only chain=tron is supported."),
        (json!({ "chain": "tron", "asset": "USDT" }), "Only asset=TRX is supported."),
        (
            json!({ "chain": "tron", "asset": "TRX", "amount": "1" }),
            "amount, from, and to are required.",
        ),
        (
            json!({ "chain": "tron", "asset": "TRX", "amount": "abc", "from": FROM, "to": TO }),
            "Invalid amount format. Must be a positive number.",
        ),
        (
            json!({ "chain": "tron", "asset": "TRX", "amount": "1", "from": "T123", "to": TO }),
            "Invalid from address.",
        ),
        (
            json!({ "chain": "tron", "asset": "TRX", "amount": "1", "from": FROM, "to": "T123" }),
            "Invalid to address.",
        ),
        (
            json!({
                "chain": "tron",
                "asset": "TRX",
                "amount": "1",
                "from": FROM,
                "to": TO,
                "signatureCount": 11
            }),
            "signatureCount must be an integer between 1 and 10.",
        ),
    ];

    let config = FeeCalcConfig::default().with_rate_limit_enabled(false);
    for (payload, message) in cases {
        let response = app_with(&config, snapshot(), Behavior::Ok)
            .oneshot(estimate_request(payload.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(json_body(response).await, json!({ "error": message }));
    }
}

#[tokio::test]
async fn invalid_json_body() {
    let response = app(Behavior::Ok).oneshot(estimate_request("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Invalid JSON body." }));
}

#[tokio::test]
async fn upstream_failures_are_not_leaked() {
    let response =
        app(Behavior::Fail).oneshot(estimate_request(payload().to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Failed to estimate fee. Please check your inputs and try again." })
    );
}

#[tokio::test]
async fn unexpected_failures_are_internal_errors() {
    let response =
        app(Behavior::Panic).oneshot(estimate_request(payload().to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(json_body(response).await, json!({ "error": "Internal server error." }));
}

#[tokio::test]
async fn unknown_routes_and_methods() {
    let cases = [(Method::GET, "/"), (Method::GET, "/api/estimate"), (Method::POST, "/health")];
    for (method, uri) in cases {
        let response = app(Behavior::Ok)
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json_body(response).await, json!({ "error": "Not found" }));
    }
}

#[tokio::test]
async fn preflight() {
    let config = FeeCalcConfig::default().with_allowed_origins([
        "https://cryptofeecalc.com".to_string(),
        "http://localhost:3000".to_string(),
    ]);

    for (origin, allowed) in [
        ("http://localhost:3000", "http://localhost:3000"),
        ("https://evil.example", "https://cryptofeecalc.com"),
    ] {
        let response = app_with(&config, snapshot(), Behavior::Ok)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/estimate")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], allowed);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }
}

#[tokio::test]
async fn rate_limited_after_quota() {
    let config = FeeCalcConfig::default().with_rate_limits(2, 100).with_trusted_proxy_headers(true);
    let app = app_with(&config, snapshot(), Behavior::Ok);

    let request = || {
        Request::builder()
            .method(Method::POST)
            .uri("/api/estimate")
            .header("cf-connecting-ip", "198.51.100.3")
            .body(Body::from(payload().to_string()))
            .unwrap()
    };

    for remaining in ["1", "0"] {
        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-remaining"], remaining);
    }

    let response = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let headers = response.headers();
    assert_eq!(headers["x-ratelimit-limit"], "2");
    assert_eq!(headers["x-ratelimit-remaining"], "0");
    assert!(headers.contains_key("x-ratelimit-reset"));
    let retry_after: u64 = headers[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after));
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let body = json_body(response).await;
    assert_eq!(body["error"], "Rate limit exceeded");
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Maximum 2 requests per minute exceeded."), "{message}");

    // other clients keep their own quota
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/estimate")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
                .body(Body::from(payload().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn untrusted_forwarded_headers_do_not_reset_quota() {
    let config = FeeCalcConfig::default().with_rate_limits(2, 100);
    let app = app_with(&config, snapshot(), Behavior::Ok);
    let peer = SocketAddr::from(([192, 0, 2, 10], 40_000));

    let request = |forwarded: &str| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/estimate")
            .header("cf-connecting-ip", forwarded)
            .header("x-forwarded-for", forwarded)
            .extension(ConnectInfo(peer))
            .body(Body::from(payload().to_string()))
            .unwrap()
    };

    for forwarded in ["198.51.100.1", "198.51.100.2"] {
        let response = app.clone().oneshot(request(forwarded)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(request("198.51.100.3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn rate_limiting_can_be_disabled() {
    let config = FeeCalcConfig::default().with_rate_limit_enabled(false);
    let response = app_with(&config, snapshot(), Behavior::Ok)
        .oneshot(estimate_request(payload().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-ratelimit-limit").is_none());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = FeeCalcConfig::default();
    config.server.max_body_bytes = 64;

    let mut payload = payload();
    payload["padding"] = json!("x".repeat(128));

    let response = app_with(&config, snapshot(), Behavior::Ok)
        .oneshot(estimate_request(payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(json_body(response).await, json!({ "error": "Request body too large." }));
}
