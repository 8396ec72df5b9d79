//! TronGrid HTTP client.

use super::TronApi;
use crate::{
    constants::TRON_PRO_API_KEY_HEADER,
    error::UpstreamError,
    types::{AccountInfo, AccountResources, ChainParameters, TronAddress, UnsignedTransaction},
};
use async_trait::async_trait;
use eyre::WrapErr;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Maximum number of body characters kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Client for the TRON full node HTTP API (`/wallet/*`), as served by TronGrid.
///
/// Addresses are always sent in base58 form with `visible: true`.
#[derive(Debug, Clone)]
pub struct TronGridClient {
    client: Client,
    endpoint: Url,
}

impl TronGridClient {
    /// Create a new client for `endpoint`.
    ///
    /// Every request carries `api_key` in the `TRON-PRO-API-KEY` header and fails after `timeout`.
    pub fn new(endpoint: Url, api_key: &str, timeout: Duration) -> eyre::Result<Self> {
        let mut api_key = HeaderValue::from_str(api_key).wrap_err("invalid TronGrid API key")?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(TRON_PRO_API_KEY_HEADER, api_key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .wrap_err("failed to build TronGrid client")?;

        Ok(Self { client, endpoint })
    }

    /// The gateway endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint.as_str().trim_end_matches('/'))
    }

    /// POSTs `body` to `path` and decodes the response.
    async fn post<T: DeserializeOwned>(
        &self,
        path: &'static str,
        body: Value,
    ) -> Result<T, UpstreamError> {
        debug!(%path, "Sending gateway request");

        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|err| UpstreamError::from_reqwest(path, err))?;

        let status = response.status();
        let text = response.text().await.map_err(|err| UpstreamError::from_reqwest(path, err))?;

        if !status.is_success() {
            warn!(%path, %status, "Gateway returned an error status");
            return Err(UpstreamError::Status { path, status, body: truncate(&text) });
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|source| UpstreamError::Malformed { path, source })?;

        if let Some(message) = gateway_error(&value) {
            return Err(UpstreamError::Gateway { path, message });
        }

        serde_json::from_value(value).map_err(|source| UpstreamError::Malformed { path, source })
    }
}

#[async_trait]
impl TronApi for TronGridClient {
    async fn get_account_resources(
        &self,
        address: &TronAddress,
    ) -> Result<AccountResources, UpstreamError> {
        self.post("/wallet/getaccountresource", json!({ "address": address, "visible": true }))
            .await
    }

    async fn get_chain_parameters(&self) -> Result<ChainParameters, UpstreamError> {
        self.post("/wallet/getchainparameters", json!({ "visible": true })).await
    }

    async fn get_account(&self, address: &TronAddress) -> Result<AccountInfo, UpstreamError> {
        self.post("/wallet/getaccount", json!({ "address": address, "visible": true })).await
    }

    async fn build_unsigned_transfer(
        &self,
        to: &TronAddress,
        amount_sun: u64,
        from: &TronAddress,
    ) -> Result<UnsignedTransaction, UpstreamError> {
        let path = "/wallet/createtransaction";
        let tx: UnsignedTransaction = self
            .post(
                path,
                json!({
                    "owner_address": from,
                    "to_address": to,
                    "amount": amount_sun,
                    "visible": true,
                }),
            )
            .await?;

        if tx.raw_data_hex.is_empty() {
            return Err(UpstreamError::Gateway {
                path,
                message: "response carries no raw_data_hex".to_string(),
            });
        }

        Ok(tx)
    }
}

/// Extracts an error reported in a 200 response, e.g. `{"Error": "..."}`.
///
/// Transaction construction failures come back as
/// `{"result": {"code": "CONTRACT_VALIDATE_ERROR", "message": "<hex>"}}`.
fn gateway_error(value: &Value) -> Option<String> {
    if let Some(error) = value.get("Error") {
        return Some(error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string()));
    }

    let result = value.get("result")?;
    let code = result.get("code")?.as_str()?;
    let message = result
        .get("message")
        .and_then(Value::as_str)
        .map(|message| decode_hex_message(message).unwrap_or_else(|| message.to_string()))
        .unwrap_or_default();
    Some(format!("{code}: {message}"))
}

/// The gateway hex encodes some messages.
fn decode_hex_message(message: &str) -> Option<String> {
    let bytes = alloy_primitives::hex::decode(message).ok()?;
    String::from_utf8(bytes).ok()
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_gateway_errors() {
        assert_eq!(
            gateway_error(&json!({ "Error": "class java.lang.NullPointerException : null" })),
            Some("class java.lang.NullPointerException : null".to_string())
        );

        // "Validate TransferContract error" hex encoded
        let message = alloy_primitives::hex::encode("Validate TransferContract error");
        let response =
            json!({ "result": { "code": "CONTRACT_VALIDATE_ERROR", "message": message } });
        assert_eq!(
            gateway_error(&response),
            Some("CONTRACT_VALIDATE_ERROR: Validate TransferContract error".to_string())
        );

        assert_eq!(gateway_error(&json!({ "txID": "ab", "raw_data_hex": "0a" })), None);
        assert_eq!(gateway_error(&json!({ "result": { "result": true } })), None);
        assert_eq!(gateway_error(&json!({})), None);
    }

    #[test]
    fn joins_paths_onto_endpoint() {
        let client = TronGridClient::new(
            "https://api.shasta.trongrid.io/".parse().unwrap(),
            "key",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.url("/wallet/getaccount"),
            "https://api.shasta.trongrid.io/wallet/getaccount"
        );
    }

    #[test]
    fn rejects_unprintable_api_key() {
        assert!(
            TronGridClient::new(
                "https://api.trongrid.io".parse().unwrap(),
                "bad\nkey",
                Duration::from_secs(1)
            )
            .is_err()
        );
    }
}
