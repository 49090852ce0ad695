//! Apply-time errors, local to one unit.
//!
//! Graph-build errors (cycles, dangling references, ambiguous producers)
//! live in `groundwork-graph` and abort a run before any side effect; the
//! errors here occur mid-run and are contained by skipping dependents.

use groundwork_model::{OutputKey, UnitName};
use thiserror::Error;

/// A failure while applying or waiting on a single unit.
#[derive(Debug, Error)]
pub enum UnitError {
    /// The provider rejected the apply call. Not retried; requires
    /// operator intervention.
    #[error("apply failed: {0:#}")]
    Apply(anyhow::Error),

    /// The readiness wait exceeded its budget. The underlying provider
    /// operation may still be in flight; this is surfaced, never
    /// swallowed.
    #[error("condition not satisfied within {budget_secs}s (provider operation may still be in flight): {last}")]
    ReadinessTimeout { budget_secs: u64, last: String },

    /// A dependency reached Ready without publishing an output this unit
    /// consumes.
    #[error("dependency '{producer}' did not publish required output '{key}'")]
    MissingInput { key: OutputKey, producer: UnitName },

    /// The run was aborted by the operator while this unit was in flight.
    #[error("run cancelled by operator")]
    Cancelled,
}

impl UnitError {
    /// True for operator-initiated aborts.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, UnitError::Cancelled)
    }
}
