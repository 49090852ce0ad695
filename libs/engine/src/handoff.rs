//! The post-convergence handoff.
//!
//! A successful run ends with a small bundle of coordinates the next tool
//! in the pipeline needs: where the cluster is, which role may administer
//! it, which network it lives in. The bundle is all-or-nothing; a partial
//! handoff would point a follow-on tool at infrastructure that does not
//! exist.

use groundwork_model::OutputKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{RunReport, RunResult};

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("run did not converge (result: {0}); no handoff emitted")]
    RunNotConverged(RunResult),

    #[error("no ready unit published required output '{0}'")]
    MissingOutput(OutputKey),
}

/// Names the output keys the handoff is assembled from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffSpec {
    pub cluster_endpoint: OutputKey,
    pub trust_role_id: OutputKey,
    pub network_id: OutputKey,
}

/// The coordinates handed to the next tool after full convergence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handoff {
    pub cluster_endpoint: String,
    pub trust_role_id: String,
    pub network_id: String,
}

impl Handoff {
    /// Assemble the handoff from a converged run's published outputs.
    ///
    /// Fails if the run did not converge or any named key is missing or
    /// empty, and never emits a partial bundle.
    pub fn from_report(report: &RunReport, spec: &HandoffSpec) -> Result<Self, HandoffError> {
        if !report.is_success() {
            return Err(HandoffError::RunNotConverged(report.result()));
        }
        let fetch = |key: &OutputKey| {
            report
                .output(key)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| HandoffError::MissingOutput(key.clone()))
        };
        Ok(Self {
            cluster_endpoint: fetch(&spec.cluster_endpoint)?,
            trust_role_id: fetch(&spec.trust_role_id)?,
            network_id: fetch(&spec.network_id)?,
        })
    }
}
