//! Plan command.
//!
//! Shows the order a plan would apply in: topological levels (everything
//! in one level may run concurrently) and the dependency edges, including
//! edges inferred from output consumption and synthetic binding units.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliError;
use crate::manifest::PlanManifest;
use crate::output::{print_output, print_single, OutputFormat};

use super::CommandContext;

/// Show the apply order a plan would run in.
#[derive(Debug, Args)]
pub struct PlanCommand {
    /// Plan file path (TOML). Defaults to ./plan.toml.
    #[arg(value_name = "PATH")]
    plan: Option<PathBuf>,
}

#[derive(Debug, Serialize, Tabled)]
struct PlanRow {
    #[tabled(rename = "LEVEL")]
    level: usize,
    #[tabled(rename = "UNIT")]
    unit: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "DEPENDS ON")]
    depends_on: String,
    #[tabled(rename = "PRODUCES")]
    produces: String,
}

impl PlanCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let path = self.plan.unwrap_or_else(|| PathBuf::from("plan.toml"));
        let manifest = PlanManifest::load(&path)?;
        let graph = groundwork_graph::build(manifest.into_units()).map_err(CliError::Plan)?;

        let rows: Vec<PlanRow> = graph
            .levels()
            .into_iter()
            .enumerate()
            .flat_map(|(level, names)| {
                names.into_iter().map(move |name| (level, name))
            })
            .map(|(level, name)| {
                let unit = graph.unit(&name).expect("level names come from the graph");
                PlanRow {
                    level,
                    unit: name.to_string(),
                    kind: unit.kind().to_string(),
                    depends_on: graph
                        .dependencies_of(&name)
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                    produces: unit
                        .produces
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                }
            })
            .collect();

        match ctx.format {
            OutputFormat::Json => print_single(&rows, OutputFormat::Json),
            OutputFormat::Table => print_output(&rows, OutputFormat::Table),
        }

        Ok(())
    }
}
