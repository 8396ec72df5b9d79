//! Fee calculator configuration.
use crate::constants::{
    DEFAULT_GATEWAY_TIMEOUT, DEFAULT_HTTP_PORT, DEFAULT_MAX_BODY_BYTES, DEFAULT_METRICS_PORT,
    DEFAULT_RATE_LIMIT_PER_HOUR, DEFAULT_RATE_LIMIT_PER_MINUTE, TRONGRID_MAINNET_URL,
};
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr},
    path::Path,
    str::FromStr,
    time::Duration,
};
use url::Url;

/// Fee calculator configuration.
///
/// Constructed once at startup and shared immutably afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCalcConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Gateway configuration.
    #[serde(default)]
    pub tron: TronConfig,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Rate limit configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Secrets.
    #[serde(skip_serializing, default)]
    pub secrets: SecretsConfig,
}

impl FeeCalcConfig {
    /// Sets the IP address to serve the API on.
    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.server.address = address;
        self
    }

    /// Sets the port to serve the API on.
    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// Sets the port to serve the metrics on.
    pub fn with_metrics_port(mut self, port: u16) -> Self {
        self.server.metrics_port = port;
        self
    }

    /// Sets the gateway endpoint.
    pub fn with_tron_endpoint(mut self, endpoint: Option<Url>) -> Self {
        if let Some(endpoint) = endpoint {
            self.tron.endpoint = endpoint;
        }
        self
    }

    /// Sets the gateway request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Some(timeout) = timeout {
            self.tron.timeout = timeout;
        }
        self
    }

    /// Sets the TronGrid API key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.secrets.api_key = api_key.or(self.secrets.api_key);
        self
    }

    /// Extends the list of allowed CORS origins.
    pub fn with_allowed_origins(mut self, origins: impl IntoIterator<Item = String>) -> Self {
        for origin in origins {
            if !self.cors.allowed_origins.contains(&origin) {
                self.cors.allowed_origins.push(origin);
            }
        }
        self
    }

    /// Enables or disables rate limiting.
    pub fn with_rate_limit_enabled(mut self, enabled: bool) -> Self {
        self.rate_limit.enabled = enabled;
        self
    }

    /// Identify rate limited clients by proxy headers instead of the peer address.
    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.rate_limit.trust_proxy_headers = trust;
        self
    }

    /// Sets the per-minute and per-hour request limits.
    pub fn with_rate_limits(mut self, per_minute: u32, per_hour: u32) -> Self {
        self.rate_limit.per_minute = per_minute;
        self.rate_limit.per_hour = per_hour;
        self
    }

    /// The TronGrid API key, required to talk to the gateway.
    pub fn api_key(&self) -> eyre::Result<&str> {
        self.secrets
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                eyre::eyre!("missing TronGrid API key, set --api-key or TRON_GRID_API_KEY")
            })
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .wrap_err_with(|| format!("failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The address to serve the API on.
    pub address: IpAddr,
    /// The port to serve the API on.
    pub port: u16,
    /// The port to serve the metrics on.
    pub metrics_port: u16,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_HTTP_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TronConfig {
    /// Full node HTTP API endpoint.
    pub endpoint: Url,
    /// Timeout of a single gateway request.
    #[serde(with = "crate::serde::duration")]
    pub timeout: Duration,
}

impl Default for TronConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::from_str(TRONGRID_MAINNET_URL).expect("valid TronGrid URL"),
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API. Any origin is allowed if empty.
    pub allowed_origins: Vec<String>,
}

/// Rate limit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether `/api/*` is rate limited.
    pub enabled: bool,
    /// Requests allowed per client per minute.
    pub per_minute: u32,
    /// Requests allowed per client per hour.
    pub per_hour: u32,
    /// Whether clients are identified by `CF-Connecting-IP` / `X-Forwarded-For`.
    ///
    /// Only enable behind a proxy that sets these headers.
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            per_hour: DEFAULT_RATE_LIMIT_PER_HOUR,
            trust_proxy_headers: false,
        }
    }
}

/// Secrets. Never written to disk.
#[derive(Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// TronGrid API key.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FeeCalcConfig::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.metrics_port, 9000);
        assert_eq!(config.tron.endpoint.as_str(), "https://api.trongrid.io/");
        assert_eq!(config.tron.timeout, Duration::from_secs(10));
        assert!(config.cors.allowed_origins.is_empty());
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.per_minute, 10);
        assert_eq!(config.rate_limit.per_hour, 100);
        assert!(!config.rate_limit.trust_proxy_headers);
        assert!(config.api_key().is_err());
    }

    #[test]
    fn partial_yaml() {
        let config: FeeCalcConfig = serde_yaml::from_str(
            r#"
server:
  port: 8080
tron:
  endpoint: https://api.shasta.trongrid.io
cors:
  allowed_origins:
    - https://cryptofeecalc.com
rate_limit:
  per_hour: 50
  trust_proxy_headers: true
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.tron.endpoint.host_str(), Some("api.shasta.trongrid.io"));
        assert_eq!(config.tron.timeout, DEFAULT_GATEWAY_TIMEOUT);
        assert_eq!(config.cors.allowed_origins, vec!["https://cryptofeecalc.com".to_string()]);
        assert_eq!(config.rate_limit.per_minute, 10);
        assert_eq!(config.rate_limit.per_hour, 50);
        assert!(config.rate_limit.trust_proxy_headers);
    }

    #[test]
    fn secrets_are_never_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feecalc.yaml");

        let config = FeeCalcConfig::default()
            .with_port(4100)
            .with_timeout(Some(Duration::from_secs(3)))
            .with_api_key(Some("secret-key".into()));
        assert_eq!(config.api_key().unwrap(), "secret-key");
        config.save_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("secret-key"));
        assert!(content.contains("timeout: 3"));

        let loaded = FeeCalcConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 4100);
        assert_eq!(loaded.tron.timeout, Duration::from_secs(3));
        assert_eq!(loaded.secrets, SecretsConfig::default());
    }

    #[test]
    fn builders_merge() {
        let config = FeeCalcConfig::default()
            .with_api_key(Some("a".into()))
            .with_api_key(None)
            .with_allowed_origins(["https://a.example", "https://a.example"].map(String::from))
            .with_rate_limit_enabled(false)
            .with_tron_endpoint(None);

        assert_eq!(config.api_key().unwrap(), "a");
        assert_eq!(config.cors.allowed_origins.len(), 1);
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.tron.endpoint.as_str(), "https://api.trongrid.io/");
        assert!(format!("{:?}", config.with_api_key(Some("b".into()))).contains("<redacted>"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FeeCalcConfig::load_from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
