//! Fee estimation.
//!
//! [`FeeEstimator`] validates a request, reads the chain state it depends on, and hands both to the
//! pure [`calculate_fee`]. Every adapter (HTTP, CLI) goes through it.

mod calculator;
pub use calculator::{bandwidth_price, calculate_fee, create_account_fee, transaction_size};

mod validation;
pub use validation::validate_request;

use crate::{
    error::{EstimateError, UpstreamError},
    tron::TronApi,
    types::{ChainSnapshot, EstimateRequest, FeeEstimate},
};
use metrics::counter;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Estimates TRX transfer fees against a [`TronApi`].
#[derive(Debug, Clone)]
pub struct FeeEstimator {
    tron: Arc<dyn TronApi>,
}

impl FeeEstimator {
    /// Create a new estimator reading chain state from `tron`.
    pub fn new(tron: Arc<dyn TronApi>) -> Self {
        Self { tron }
    }

    /// Validates `payload` and estimates its fee.
    pub async fn estimate(&self, payload: &Value) -> Result<FeeEstimate, EstimateError> {
        let request = validate_request(payload).inspect_err(|err| {
            debug!(%err, "Rejected estimate request");
            counter!("estimate.count", "outcome" => "invalid").increment(1);
        })?;

        self.estimate_request(&request).await
    }

    /// Estimates the fee of an already validated request.
    #[instrument(
        skip_all,
        fields(from = %request.from, to = %request.to, amount = %request.amount)
    )]
    pub async fn estimate_request(
        &self,
        request: &EstimateRequest,
    ) -> Result<FeeEstimate, EstimateError> {
        let snapshot = match self.fetch_snapshot(request).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(%err, "Failed to read chain state");
                counter!("estimate.count", "outcome" => "upstream_error").increment(1);
                return Err(err.into());
            }
        };

        let estimate = calculate_fee(request, &snapshot);
        debug!(total_fee_sun = %estimate.total_fee_sun, "Estimated fee");
        counter!("estimate.count", "outcome" => "ok").increment(1);

        Ok(estimate)
    }

    /// Reads sender resources, chain parameters and the receiver account, and builds the
    /// representative transfer, all concurrently.
    ///
    /// Fails as soon as any of them fails.
    #[instrument(skip_all)]
    pub async fn fetch_snapshot(
        &self,
        request: &EstimateRequest,
    ) -> Result<ChainSnapshot, UpstreamError> {
        let (resources, parameters, destination, transaction) = tokio::try_join!(
            self.tron.get_account_resources(&request.from_address),
            self.tron.get_chain_parameters(),
            self.tron.get_account(&request.to_address),
            self.tron.build_unsigned_transfer(
                &request.to_address,
                request.amount_sun,
                &request.from_address
            ),
        )?;

        Ok(ChainSnapshot { resources, parameters, destination, transaction })
    }
}
