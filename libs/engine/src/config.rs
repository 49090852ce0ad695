//! Engine configuration (env-driven, CLI flags override).

use std::time::Duration;

use anyhow::{Context, Result};

/// Scheduler knobs for one run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of units applied concurrently. `None` means
    /// unbounded within a level.
    pub max_parallel: Option<usize>,

    /// Lower bound on readiness polling intervals, so a policy declaring a
    /// zero interval cannot busy-poll the provider.
    pub poll_floor: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parallel: None,
            poll_floor: Duration::from_millis(100),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let max_parallel: Option<usize> = std::env::var("GROUNDWORK_MAX_PARALLEL")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("GROUNDWORK_MAX_PARALLEL must be an integer.")?
            .filter(|n| *n > 0);

        let poll_floor_ms: u64 = std::env::var("GROUNDWORK_POLL_FLOOR_MS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("GROUNDWORK_POLL_FLOOR_MS must be an integer (milliseconds).")?
            .unwrap_or(100);

        Ok(Self {
            max_parallel,
            poll_floor: Duration::from_millis(poll_floor_ms.max(10)),
        })
    }

    /// Override the parallelism bound.
    pub fn with_max_parallel(mut self, max_parallel: Option<usize>) -> Self {
        self.max_parallel = max_parallel;
        self
    }
}
