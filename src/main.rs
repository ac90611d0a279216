use anyhow::Result;
use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod core;
mod error;

use crate::cli::Cli;
use crate::core::Engine;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides the CLI level when set.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting cflowgraph v{}", env!("CARGO_PKG_VERSION"));

    let engine = Engine::new(cli.config.as_deref())?;

    cli.execute(engine)
}
