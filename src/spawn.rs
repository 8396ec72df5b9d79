//! Fee calculator spawn utilities.
use crate::{
    cli::Args,
    config::FeeCalcConfig,
    constants::RATE_LIMIT_PRUNE_INTERVAL,
    estimator::FeeEstimator,
    http::{ApiState, router},
    metrics,
    tron::TronGridClient,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, path::Path, sync::Arc};
use tokio::{net::TcpListener, sync::watch, task::JoinHandle};
use tracing::info;

/// Context returned once the fee calculator is launched.
#[derive(Debug)]
pub struct FeeCalcHandle {
    /// The socket address to which the server is bound.
    pub local_addr: SocketAddr,
    /// The server task. Resolves once the server stopped.
    pub server: JoinHandle<std::io::Result<()>>,
    /// Metrics collector handle.
    pub metrics: PrometheusHandle,
    /// Task pruning rate limit counters, if rate limiting is enabled.
    pruner: Option<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl FeeCalcHandle {
    /// Returns the url to the http server
    pub fn http_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Starts a graceful shutdown: in-flight requests complete, new connections are refused.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Waits for the server to stop.
    pub async fn stopped(self) -> eyre::Result<()> {
        let result = self.server.await;
        if let Some(pruner) = self.pruner {
            pruner.abort();
        }
        result?.map_err(Into::into)
    }
}

/// Attempts to spawn the fee calculator using CLI arguments and a configuration file.
pub async fn try_spawn_with_args<P: AsRef<Path>>(
    args: Args,
    config_path: P,
) -> eyre::Result<FeeCalcHandle> {
    let config = if !config_path.as_ref().exists() {
        let config = args.merge_config(FeeCalcConfig::default());
        config.save_to_file(&config_path)?;
        config
    } else {
        // File exists: load and override with CLI values.
        args.merge_config(FeeCalcConfig::load_from_file(&config_path)?)
    };

    try_spawn(config).await
}

/// Spawns the fee calculator using the provided [`FeeCalcConfig`].
pub async fn try_spawn(config: FeeCalcConfig) -> eyre::Result<FeeCalcHandle> {
    let config = Arc::new(config);

    let metrics =
        metrics::setup_exporter((config.server.address, config.server.metrics_port)).await;

    // construct gateway client
    let client =
        TronGridClient::new(config.tron.endpoint.clone(), config.api_key()?, config.tron.timeout)?;
    info!(
        endpoint = %client.endpoint(),
        timeout_secs = config.tron.timeout.as_secs(),
        "Using TRON gateway"
    );

    let estimator = FeeEstimator::new(Arc::new(client));
    let state = ApiState::new(estimator, &config);

    let pruner =
        state.rate_limiter.clone().map(|limiter| limiter.spawn_pruner(RATE_LIMIT_PRUNE_INTERVAL));
    if pruner.is_none() {
        info!("Rate limiting disabled");
    }

    // start server
    let listener = TcpListener::bind((config.server.address, config.server.port)).await?;
    let local_addr = listener.local_addr()?;

    let (shutdown, mut shutdown_rx) = watch::channel(false);
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    info!(addr = %local_addr, "Started fee calculator service");

    Ok(FeeCalcHandle { local_addr, server, metrics, pruner, shutdown })
}
