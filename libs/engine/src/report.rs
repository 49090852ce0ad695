//! Convergence reporting.
//!
//! After a run ends the scheduler assembles a [`RunReport`]: one entry per
//! unit with its terminal state, timing and outputs, plus an overall
//! result. The report is the engine's only durable product; callers render
//! it, derive a handoff from it, or serialize it for operators.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use groundwork_graph::DeploymentGraph;
use groundwork_model::{OutputKey, Outputs, ResourceKind, RunId, UnitName};
use serde::Serialize;

use crate::{ApplyRecord, ApplyState};

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunResult {
    /// Every unit reached Ready.
    Converged,
    /// At least one unit failed; its dependents were skipped.
    Failed,
    /// The run was cancelled before completion.
    Cancelled,
}

impl RunResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunResult::Converged => "converged",
            RunResult::Failed => "failed",
            RunResult::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal account of one unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub name: UnitName,
    pub kind: ResourceKind,
    pub state: ApplyState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Failure or skip reason; `None` for Ready units.
    pub detail: Option<String>,
    pub outputs: Outputs,
    pub spec_hash: String,
}

impl UnitReport {
    /// Wall-clock seconds between start and finish, when both are known.
    pub fn duration_secs(&self) -> Option<f64> {
        let started = self.started_at?;
        let finished = self.finished_at?;
        Some((finished - started).as_seconds_f64())
    }
}

/// The full account of one apply run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub result: RunResult,
    pub units: Vec<UnitReport>,
}

impl RunReport {
    pub(crate) fn assemble(
        run_id: RunId,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        cancelled: bool,
        graph: &DeploymentGraph,
        records: BTreeMap<UnitName, ApplyRecord>,
    ) -> Self {
        let units: Vec<UnitReport> = records
            .into_iter()
            .map(|(name, rec)| {
                let unit = graph.unit(&name).expect("record exists only for graph units");
                UnitReport {
                    kind: unit.kind(),
                    spec_hash: unit.spec_hash(),
                    name,
                    state: rec.state,
                    started_at: rec.started_at,
                    finished_at: rec.finished_at,
                    detail: rec.detail,
                    outputs: rec.outputs,
                }
            })
            .collect();
        let result = if cancelled {
            RunResult::Cancelled
        } else if units.iter().all(|u| u.state == ApplyState::Ready) {
            RunResult::Converged
        } else {
            RunResult::Failed
        };
        Self { run_id, started_at, finished_at, result, units }
    }

    pub fn result(&self) -> RunResult {
        self.result
    }

    pub fn is_success(&self) -> bool {
        self.result == RunResult::Converged
    }

    pub fn unit(&self, name: &UnitName) -> Option<&UnitReport> {
        self.units.iter().find(|u| &u.name == name)
    }

    /// (ready, failed, skipped) counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut ready = 0;
        let mut failed = 0;
        let mut skipped = 0;
        for unit in &self.units {
            match unit.state {
                ApplyState::Ready => ready += 1,
                ApplyState::Failed => failed += 1,
                ApplyState::Skipped => skipped += 1,
                _ => {}
            }
        }
        (ready, failed, skipped)
    }

    /// Look up a published output across all Ready units.
    pub fn output(&self, key: &OutputKey) -> Option<&str> {
        self.units
            .iter()
            .filter(|u| u.state == ApplyState::Ready)
            .find_map(|u| u.outputs.get(key).map(String::as_str))
    }
}
