//! Per-unit apply records.

use chrono::{DateTime, Utc};
use groundwork_model::Outputs;
use serde::Serialize;

/// The lifecycle state of one unit within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyState {
    /// Not yet admitted; dependencies unsatisfied.
    Pending,
    /// The apply call is in flight.
    Applying,
    /// Applied; polling the readiness condition.
    WaitingReady,
    /// Converged; dependents may start.
    Ready,
    /// The apply or wait failed.
    Failed,
    /// Never attempted because an upstream unit failed or the run was
    /// cancelled.
    Skipped,
}

impl ApplyState {
    /// Terminal states end a unit's participation in the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplyState::Ready | ApplyState::Failed | ApplyState::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyState::Pending => "pending",
            ApplyState::Applying => "applying",
            ApplyState::WaitingReady => "waiting_ready",
            ApplyState::Ready => "ready",
            ApplyState::Failed => "failed",
            ApplyState::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for ApplyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit's record for one run. Created when the scheduler admits the
/// unit; mutated only by the scheduler loop.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyRecord {
    pub state: ApplyState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Failure cause chain, or the skip reason.
    pub detail: Option<String>,
    /// Outputs published when the unit became Ready.
    #[serde(skip_serializing_if = "Outputs::is_empty")]
    pub outputs: Outputs,
}

impl ApplyRecord {
    pub fn new() -> Self {
        Self {
            state: ApplyState::Pending,
            started_at: None,
            finished_at: None,
            detail: None,
            outputs: Outputs::new(),
        }
    }

    pub(crate) fn start(&mut self) {
        self.state = ApplyState::Applying;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn waiting(&mut self) {
        self.state = ApplyState::WaitingReady;
    }

    pub(crate) fn ready(&mut self, outputs: Outputs) {
        self.state = ApplyState::Ready;
        self.finished_at = Some(Utc::now());
        self.outputs = outputs;
    }

    pub(crate) fn failed(&mut self, detail: String) {
        self.state = ApplyState::Failed;
        self.finished_at = Some(Utc::now());
        self.detail = Some(detail);
    }

    pub(crate) fn skipped(&mut self, reason: String) {
        self.state = ApplyState::Skipped;
        self.finished_at = Some(Utc::now());
        self.detail = Some(reason);
    }
}

impl Default for ApplyRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!ApplyState::Pending.is_terminal());
        assert!(!ApplyState::Applying.is_terminal());
        assert!(!ApplyState::WaitingReady.is_terminal());
        assert!(ApplyState::Ready.is_terminal());
        assert!(ApplyState::Failed.is_terminal());
        assert!(ApplyState::Skipped.is_terminal());
    }

    #[test]
    fn transitions_stamp_timestamps() {
        let mut record = ApplyRecord::new();
        assert_eq!(record.state, ApplyState::Pending);
        record.start();
        assert!(record.started_at.is_some());
        record.ready(Outputs::new());
        assert!(record.finished_at.is_some());
        assert_eq!(record.state, ApplyState::Ready);
    }
}
