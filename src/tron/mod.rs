//! TRON gateway access.
//!
//! The estimator only depends on [`TronApi`]; [`TronGridClient`] is the production implementation
//! talking to the full node HTTP API exposed by TronGrid.

mod client;
pub use client::TronGridClient;

use crate::{
    error::UpstreamError,
    types::{AccountInfo, AccountResources, ChainParameters, TronAddress, UnsignedTransaction},
};
use async_trait::async_trait;

/// Read access to TRON chain state, plus unsigned transaction construction.
#[async_trait]
pub trait TronApi: Send + Sync + std::fmt::Debug {
    /// Bandwidth counters of `address`.
    async fn get_account_resources(
        &self,
        address: &TronAddress,
    ) -> Result<AccountResources, UpstreamError>;

    /// Current chain parameters.
    async fn get_chain_parameters(&self) -> Result<ChainParameters, UpstreamError>;

    /// Account record of `address`. Unknown accounts yield an empty [`AccountInfo`].
    async fn get_account(&self, address: &TronAddress) -> Result<AccountInfo, UpstreamError>;

    /// Builds an unsigned TRX transfer of `amount_sun` from `from` to `to`.
    ///
    /// The transaction is only used to measure its size. It is never signed or broadcast.
    async fn build_unsigned_transfer(
        &self,
        to: &TronAddress,
        amount_sun: u64,
        from: &TronAddress,
    ) -> Result<UnsignedTransaction, UpstreamError>;
}
