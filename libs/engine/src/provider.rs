//! The cloud-provisioning seam.
//!
//! The engine calls the outside world only through opaque per-kind
//! `apply` and `describe` operations. Provider-specific request and
//! response shapes stay behind this trait; the engine sees exactly what
//! readiness policy needs and nothing more.

use std::collections::BTreeMap;

use async_trait::async_trait;
use groundwork_model::{OutputKey, Outputs, ResourceUnit, UnitName};

/// Dependency outputs resolved for one unit's apply call.
pub type ResolvedInputs = BTreeMap<OutputKey, String>;

/// Opaque handle to a provider-side operation, used for status polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHandle {
    /// The unit the operation belongs to.
    pub unit: UnitName,
    /// Provider-assigned operation id.
    pub id: String,
}

/// The result of an accepted apply call.
#[derive(Debug, Clone)]
pub struct Applied {
    pub handle: ProviderHandle,
    /// The outputs the unit publishes once Ready.
    pub outputs: Outputs,
}

/// Convergence status reported by `describe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionStatus {
    /// The unit's effects are visible to dependents.
    Satisfied,
    /// Still converging.
    Pending { reason: String },
}

impl ConditionStatus {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, ConditionStatus::Satisfied)
    }
}

/// Cloud provisioning interface.
///
/// `apply` submits one unit's desired state and returns a handle plus the
/// outputs the unit will publish; `describe` reports whether the operation
/// behind a handle has converged. Both are long-running network calls and
/// treated as suspension points.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Submit the unit's desired state to the provider.
    async fn apply(&self, unit: &ResourceUnit, inputs: &ResolvedInputs) -> anyhow::Result<Applied>;

    /// Report convergence status for a previously accepted apply.
    async fn describe(&self, handle: &ProviderHandle) -> anyhow::Result<ConditionStatus>;
}
