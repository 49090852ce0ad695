//! Per-unit readiness policies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ResourceKind;

fn default_poll_interval_secs() -> u64 {
    10
}

/// How the engine decides that an applied unit has converged.
///
/// The policy is declared at construction time and immutable for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReadinessPolicy {
    /// The apply call itself blocks until the provider confirms creation.
    #[default]
    Synchronous,

    /// Poll the provider's status predicate until satisfied or the timeout
    /// elapses. A zero timeout still performs one check before failing.
    WaitForCondition {
        timeout_secs: u64,
        #[serde(default = "default_poll_interval_secs")]
        poll_interval_secs: u64,
    },

    /// Ready as soon as the apply call is accepted; no blocking wait.
    /// Used for best-effort add-ons whose dependents tolerate eventual
    /// readiness (the GPU device plugin, the node autoscaler).
    FireAndForget,
}

impl ReadinessPolicy {
    /// Wait-for-condition with the given timeout and the default interval.
    pub fn wait(timeout: Duration) -> Self {
        Self::WaitForCondition {
            timeout_secs: timeout.as_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }

    /// The default policy for a kind.
    ///
    /// Clusters and releases converge asynchronously; networks, trusts,
    /// bindings, secret stores and plain manifests confirm synchronously.
    pub fn default_for(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::ManagedCluster => Self::WaitForCondition {
                timeout_secs: 1800,
                poll_interval_secs: 15,
            },
            ResourceKind::PackageRelease => Self::WaitForCondition {
                timeout_secs: 900,
                poll_interval_secs: 10,
            },
            ResourceKind::Network
            | ResourceKind::IdentityTrust
            | ResourceKind::ClusterObject
            | ResourceKind::SecretStore
            | ResourceKind::IdentityBinding => Self::Synchronous,
        }
    }

    /// The condition timeout, if this policy waits.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Self::WaitForCondition { timeout_secs, .. } => {
                Some(Duration::from_secs(*timeout_secs))
            }
            _ => None,
        }
    }

    /// The polling interval, if this policy waits.
    pub fn poll_interval(&self) -> Option<Duration> {
        match self {
            Self::WaitForCondition {
                poll_interval_secs, ..
            } => Some(Duration::from_secs(*poll_interval_secs)),
            _ => None,
        }
    }
}
