//! # TRON fee calculator
//!
//! An HTTP service estimating the network fee of TRX transfers.

use clap::Parser;
use feecalc::cli::Cli;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, prelude::*};

fn init_tracing_subscriber() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(
            EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy(),
        ))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing_subscriber();

    let cli = Cli::parse();
    if let Err(err) = cli.run().await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
