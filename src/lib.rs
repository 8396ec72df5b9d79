//! # TRON fee calculator
//!
//! Library for estimating the network fee of native TRX transfers: bandwidth burn plus the
//! account creation fee, computed from a point-in-time read of chain state.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod estimator;
pub mod http;
pub mod metrics;
pub mod serde;
pub mod spawn;
pub mod tron;
pub mod types;
