//! Apply command.
//!
//! Builds the graph from a plan file and drives it to convergence with the
//! scheduler. v1 ships the simulated provider only, so `--simulate` is
//! required; the flag stays explicit so a future cloud-backed apply cannot
//! be triggered by accident. Ctrl-C requests cancellation: pending units
//! are skipped and in-flight units fail, then the report prints as usual.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use groundwork_engine::{
    EngineConfig, Handoff, HandoffError, HandoffSpec, RunReport, RunResult, Scheduler,
    SimProvider, UnitReport,
};
use serde::Serialize;
use tabled::Tabled;
use tokio::sync::watch;
use tracing::warn;

use crate::error::CliError;
use crate::manifest::PlanManifest;
use crate::output::{colorize_state, print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Run a plan to convergence.
#[derive(Debug, Args)]
pub struct ApplyCommand {
    /// Plan file path (TOML). Defaults to ./plan.toml.
    #[arg(value_name = "PATH")]
    plan: Option<PathBuf>,

    /// Run against the in-memory simulated provider.
    #[arg(long)]
    simulate: bool,

    /// Maximum number of units applied concurrently.
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,
}

#[derive(Debug, Serialize, Tabled)]
struct ApplyRow {
    #[tabled(rename = "UNIT")]
    unit: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "DURATION")]
    duration: String,
    #[tabled(rename = "DETAIL")]
    detail: String,
}

impl ApplyRow {
    fn from_report(unit: &UnitReport) -> Self {
        Self {
            unit: unit.name.to_string(),
            kind: unit.kind.to_string(),
            state: colorize_state(unit.state.as_str()),
            duration: unit
                .duration_secs()
                .map(|s| format!("{s:.1}s"))
                .unwrap_or_else(|| "-".to_string()),
            detail: unit.detail.clone().unwrap_or_default(),
        }
    }
}

impl ApplyCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let ApplyCommand { plan, simulate, max_parallel } = self;
        if !simulate {
            anyhow::bail!(
                "only simulated applies are supported; re-run with --simulate"
            );
        }

        let path = plan.unwrap_or_else(|| PathBuf::from("plan.toml"));
        let manifest = PlanManifest::load(&path)?;
        let handoff_spec = manifest.handoff.clone();
        let graph = groundwork_graph::build(manifest.into_units()).map_err(CliError::Plan)?;

        // Flag wins over GROUNDWORK_MAX_PARALLEL.
        let mut config = EngineConfig::from_env()?;
        if max_parallel.is_some() {
            config = config.with_max_parallel(max_parallel);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; cancelling run");
                let _ = shutdown_tx.send(true);
            } else {
                // Keep the channel open if the signal handler fails.
                std::future::pending::<()>().await;
            }
        });

        let scheduler = Scheduler::new(Arc::new(SimProvider::new()), config);
        let report = scheduler.run(&graph, shutdown_rx).await;

        // The report always renders, even when the handoff cannot be
        // assembled; operators need the per-unit account either way.
        let handoff = gated_handoff(&report, handoff_spec.as_ref());
        Self::render(&ctx, &report, handoff.as_ref().ok().and_then(Option::as_ref));
        let _ = handoff?;

        match report.result() {
            RunResult::Converged => Ok(()),
            RunResult::Cancelled => Err(CliError::Cancelled.into()),
            RunResult::Failed => {
                let (_, failed, skipped) = report.counts();
                Err(CliError::RunFailed { failed, skipped }.into())
            }
        }
    }

    fn render(ctx: &CommandContext, report: &RunReport, handoff: Option<&Handoff>) {
        match ctx.format {
            OutputFormat::Json => {
                let out = serde_json::json!({
                    "report": report,
                    "handoff": handoff,
                });
                print_single(&out, OutputFormat::Json);
            }
            OutputFormat::Table => {
                let rows: Vec<ApplyRow> =
                    report.units.iter().map(ApplyRow::from_report).collect();
                print_output(&rows, OutputFormat::Table);
                let (ready, failed, skipped) = report.counts();
                println!(
                    "\n{} run {}: {} ready, {} failed, {} skipped",
                    report.result(),
                    report.run_id,
                    ready,
                    failed,
                    skipped
                );
                if let Some(handoff) = handoff {
                    print_success("Handoff:");
                    println!("  cluster_endpoint: {}", handoff.cluster_endpoint);
                    println!("  trust_role_id:    {}", handoff.trust_role_id);
                    println!("  network_id:       {}", handoff.network_id);
                }
            }
        }
    }
}

/// Assemble the handoff when the plan asked for one and the run converged.
///
/// A plan without a `[handoff]` section, or a run that did not converge,
/// yields `Ok(None)`; only a converged run missing a named output is an
/// error.
fn gated_handoff(
    report: &RunReport,
    spec: Option<&HandoffSpec>,
) -> Result<Option<Handoff>, HandoffError> {
    match (spec, report.is_success()) {
        (Some(spec), true) => Handoff::from_report(report, spec).map(Some),
        _ => Ok(None),
    }
}
