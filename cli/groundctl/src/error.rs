//! Error handling and display for the CLI.

use colored::Colorize;
use groundwork_graph::GraphError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Plan is invalid: {0}")]
    Plan(#[from] GraphError),

    #[error("Run did not converge: {failed} failed, {skipped} skipped")]
    RunFailed { failed: usize, skipped: usize },

    #[error("Run cancelled before convergence")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    // Chain of causes, indented below the headline.
    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "caused by:".dimmed(), cause);
    }

    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::Plan(GraphError::CycleDetected { .. }) => {
                eprintln!(
                    "\n{}",
                    "Hint: Remove one dependency in the cycle, or split the unit that closes it."
                        .yellow()
                );
            }
            CliError::Plan(GraphError::AmbiguousProducer { .. }) => {
                eprintln!(
                    "\n{}",
                    "Hint: Each output key may be declared by at most one unit.".yellow()
                );
            }
            CliError::RunFailed { .. } => {
                eprintln!(
                    "\n{}",
                    "Hint: Inspect the failed units above; their dependents were skipped, not attempted."
                        .yellow()
                );
            }
            _ => {}
        }
    }
}
