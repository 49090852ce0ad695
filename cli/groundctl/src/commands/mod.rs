//! CLI commands.

mod apply;
mod plan;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// groundwork CLI - Validate, plan and apply provisioning plans.
#[derive(Debug, Parser)]
#[command(name = "gw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate a plan file and its dependency graph (offline).
    Validate(validate::ValidateCommand),

    /// Show the apply order a plan would run in.
    Plan(plan::PlanCommand),

    /// Run a plan to convergence.
    Apply(apply::ApplyCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let format = match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        };

        let ctx = CommandContext { format };

        match self.command {
            Commands::Validate(cmd) => cmd.run(ctx),
            Commands::Plan(cmd) => cmd.run(ctx),
            Commands::Apply(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("gw {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub format: OutputFormat,
}
