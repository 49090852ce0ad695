//! The closed set of resource kinds.

use serde::{Deserialize, Serialize};

/// The kind of a resource unit.
///
/// Per-kind behavior (how to apply, how to wait) dispatches over this tag.
/// `IdentityBinding` is only ever created by the graph builder's binder
/// expansion; plan authors declare bindings through the `service_account`
/// field of a release or cluster object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A virtual network with subnets and gateway capacity.
    Network,
    /// An IAM-style trust: a role assumable by a principal or OIDC subject.
    IdentityTrust,
    /// A managed container-orchestration cluster.
    ManagedCluster,
    /// A package-manager (chart) release installed into a cluster.
    PackageRelease,
    /// A raw cluster-scoped object (manifest).
    ClusterObject,
    /// An externally-stored secret reference.
    SecretStore,
    /// A workload identity bound to permitted actions (synthetic).
    IdentityBinding,
}

impl ResourceKind {
    /// Stable snake_case name, used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Network => "network",
            ResourceKind::IdentityTrust => "identity_trust",
            ResourceKind::ManagedCluster => "managed_cluster",
            ResourceKind::PackageRelease => "package_release",
            ResourceKind::ClusterObject => "cluster_object",
            ResourceKind::SecretStore => "secret_store",
            ResourceKind::IdentityBinding => "identity_binding",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
