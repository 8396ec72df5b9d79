//! # Fee calculator CLI
use crate::{
    config::FeeCalcConfig,
    constants::{DEFAULT_HTTP_PORT, DEFAULT_METRICS_PORT, SUPPORTED_ASSET, SUPPORTED_CHAIN},
    estimator::FeeEstimator,
    spawn::try_spawn_with_args,
    tron::TronGridClient,
    types::EstimatePayload,
};
use clap::{Parser, Subcommand};
use std::{
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::info;
use url::Url;

/// Estimates the network fee of TRX transfers on TRON.
#[derive(Debug, Parser)]
#[command(author, version, about = "TRON fee calculator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Run the selected command.
    pub async fn run(self) -> eyre::Result<()> {
        match self.command {
            Command::Serve(args) => args.run().await,
            Command::Estimate(args) => args.run().await,
        }
    }
}

/// Commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API.
    Serve(Args),
    /// Estimate the fee of a single transfer and print it as JSON.
    Estimate(EstimateArgs),
}

/// Configuration flags shared by all commands.
#[derive(Debug, Clone, clap::Args)]
pub struct Args {
    /// The configuration file.
    ///
    /// If missing, a default one will be used and stored in the working directory under
    /// `feecalc.yaml`.
    #[arg(long, value_name = "CONFIG", env = "FEECALC_CONFIG", default_value = "feecalc.yaml")]
    pub config: PathBuf,
    /// The address to serve the API on.
    #[arg(
        long = "http.addr",
        value_name = "ADDR",
        default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST)
    )]
    pub address: IpAddr,
    /// The port to serve the API on.
    #[arg(long = "http.port", value_name = "PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub port: u16,
    /// The port to serve the metrics on.
    #[arg(long = "http.metrics-port", value_name = "PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,
    /// The TRON full node HTTP API endpoint.
    ///
    /// Defaults to TronGrid mainnet.
    #[arg(long = "tron-endpoint", value_name = "URL", env = "TRON_GRID_ENDPOINT")]
    pub tron_endpoint: Option<Url>,
    /// The TronGrid API key.
    #[arg(long = "api-key", value_name = "KEY", env = "TRON_GRID_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Timeout of a single gateway request.
    #[arg(long, value_name = "SECONDS", value_parser = parse_duration_secs)]
    pub timeout: Option<Duration>,
    /// An origin allowed to call the API. Can be repeated.
    #[arg(long = "allowed-origin", value_name = "ORIGIN")]
    pub allowed_origins: Vec<String>,
    /// Disables rate limiting of `/api/*`.
    #[arg(long)]
    pub disable_rate_limit: bool,
    /// Rate limit clients by `CF-Connecting-IP` / `X-Forwarded-For`. Only use behind a proxy
    /// setting these headers.
    #[arg(long)]
    pub trust_proxy_headers: bool,
}

impl Args {
    /// Run the HTTP API until Ctrl-C.
    pub async fn run(self) -> eyre::Result<()> {
        let config_path = self.config.clone();
        let mut handle = try_spawn_with_args(self, &config_path).await?;

        tokio::select! {
            result = &mut handle.server => {
                return result?.map_err(Into::into);
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received Ctrl-C, shutting down");
            }
        }

        handle.shutdown();
        handle.stopped().await
    }

    /// Merges [`Args`] values into an existing [`FeeCalcConfig`] instance.
    pub fn merge_config(self, config: FeeCalcConfig) -> FeeCalcConfig {
        let config = config
            .with_address(self.address)
            .with_port(self.port)
            .with_metrics_port(self.metrics_port)
            .with_tron_endpoint(self.tron_endpoint)
            .with_api_key(self.api_key)
            .with_timeout(self.timeout)
            .with_allowed_origins(self.allowed_origins);

        let config = if self.trust_proxy_headers {
            config.with_trusted_proxy_headers(true)
        } else {
            config
        };

        if self.disable_rate_limit { config.with_rate_limit_enabled(false) } else { config }
    }

    /// Loads the configuration file if present and merges the CLI values on top, without
    /// writing anything.
    pub fn load_config(self, config_path: &Path) -> eyre::Result<FeeCalcConfig> {
        let config = if config_path.exists() {
            FeeCalcConfig::load_from_file(config_path)?
        } else {
            FeeCalcConfig::default()
        };
        Ok(self.merge_config(config))
    }
}

/// Flags of the `estimate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct EstimateArgs {
    /// Sender address.
    #[arg(long)]
    pub from: String,
    /// Receiver address.
    #[arg(long)]
    pub to: String,
    /// Amount in TRX.
    #[arg(long)]
    pub amount: String,
    /// Number of signatures the transaction will carry.
    #[arg(long)]
    pub signature_count: Option<u64>,
    #[command(flatten)]
    pub args: Args,
}

impl EstimateArgs {
    /// The request this command estimates.
    pub fn payload(&self) -> EstimatePayload {
        EstimatePayload {
            chain: SUPPORTED_CHAIN.to_string(),
            asset: SUPPORTED_ASSET.to_string(),
            amount: self.amount.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            signature_count: self.signature_count,
        }
    }

    /// Estimate once and print the result.
    pub async fn run(self) -> eyre::Result<()> {
        let payload = serde_json::to_value(self.payload())?;
        let config_path = self.args.config.clone();
        let config = self.args.load_config(&config_path)?;

        let client = TronGridClient::new(
            config.tron.endpoint.clone(),
            config.api_key()?,
            config.tron.timeout,
        )?;
        let estimator = FeeEstimator::new(Arc::new(client));

        match estimator.estimate(&payload).await {
            Ok(estimate) => {
                println!("{}", serde_json::to_string_pretty(&estimate)?);
                Ok(())
            }
            Err(err) => eyre::bail!(err.public_message()),
        }
    }
}

/// Parses a string representing seconds to a [`Duration`].
fn parse_duration_secs(arg: &str) -> Result<std::time::Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(std::time::Duration::from_secs(seconds))
}
