//! groundctl (gw) - CLI for the groundwork provisioning engine.
//!
//! Validates and plans deployment manifests, and drives simulated apply
//! runs against a local in-memory provider.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod error;
mod manifest;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so table/json output on stdout stays clean.
    // Quiet by default; RUST_LOG overrides.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
