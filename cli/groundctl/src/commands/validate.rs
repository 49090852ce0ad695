//! Validate command.
//!
//! Operates purely on a local plan file: parses it, validates every unit
//! payload, and builds the dependency graph so cycle and reference errors
//! surface before anything is applied.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::error::CliError;
use crate::manifest::{plan_hash_from_toml_str, PlanManifest};
use crate::output::{print_info, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Validate a plan file (offline).
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Plan file path (TOML). Defaults to ./plan.toml.
    #[arg(value_name = "PATH")]
    plan: Option<PathBuf>,
}

impl ValidateCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let path = self.plan.unwrap_or_else(|| PathBuf::from("plan.toml"));
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read plan {}: {e}", path.display()))?;

        let manifest = PlanManifest::from_toml_str(&contents)?;
        let has_handoff = manifest.handoff.is_some();
        let unit_count = manifest.units.len();

        let graph = groundwork_graph::build(manifest.into_units()).map_err(CliError::Plan)?;
        let hash = plan_hash_from_toml_str(&contents)?;

        match ctx.format {
            OutputFormat::Json => {
                let out = serde_json::json!({
                    "valid": true,
                    "plan_hash": hash,
                    "units": unit_count,
                    "edges": graph.edges().len(),
                    "handoff": has_handoff,
                });
                print_single(&out, OutputFormat::Json);
            }
            OutputFormat::Table => {
                print_success(&format!(
                    "Plan is valid: {} ({} units, {} edges)",
                    path.display(),
                    unit_count,
                    graph.edges().len()
                ));
                print_info(&format!("plan_hash: {}", hash));
            }
        }

        Ok(())
    }
}
