//! Kind-specific configuration payloads.
//!
//! Payload shapes mirror what a layered cluster bootstrap actually needs:
//! a tagged network, two flavors of trust (principal role and OIDC
//! federation), a version-pinned managed cluster with an endpoint
//! allowlist, chart releases with wait/atomic install semantics, raw
//! cluster manifests, and secret references. Operator-specific literals
//! (allowlist CIDRs, principal ARNs) are plan inputs, never constants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ConfigurationError, ResourceKind, ValueRef};

/// A virtual network: address space, zone spread, gateway capacity, and
/// the subnet tags that downstream controllers discover subnets by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Address space, e.g. `10.0.0.0/16`.
    pub cidr: String,

    /// How many availability zones to spread subnets across.
    #[serde(default = "default_max_zones")]
    pub max_zones: u8,

    /// NAT gateway count for private-subnet egress.
    #[serde(default = "default_nat_gateways")]
    pub nat_gateways: u8,

    /// Tags applied to private subnets (internal load-balancer role tags,
    /// autoscaler discovery tags).
    #[serde(default)]
    pub subnet_tags: BTreeMap<String, String>,
}

fn default_max_zones() -> u8 {
    2
}

fn default_nat_gateways() -> u8 {
    1
}

/// An identity trust: who may assume the role this unit creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trust", rename_all = "snake_case")]
pub enum TrustSpec {
    /// Trust a concrete principal (an operator's user or base role).
    Role {
        principal_arn: String,
        #[serde(default)]
        managed_policies: Vec<String>,
        /// Require MFA on assume-role.
        #[serde(default)]
        require_mfa: bool,
        #[serde(default)]
        role_name: Option<String>,
    },

    /// Federate with an OIDC issuer (CI deploy roles).
    Oidc {
        issuer_url: String,
        audience: String,
        /// Subject condition, e.g. `repo:owner/name:ref:refs/heads/main`.
        subject_pattern: String,
        /// Pinned issuer thumbprints, avoiding a network lookup at apply.
        #[serde(default)]
        thumbprints: Vec<String>,
        #[serde(default)]
        managed_policies: Vec<String>,
        #[serde(default)]
        role_name: Option<String>,
    },
}

/// A managed container-orchestration cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Control-plane version, e.g. `1.32`.
    pub version: String,

    /// The network to place the cluster in.
    pub network: ValueRef,

    /// CIDRs allowed to reach the public endpoint. Empty means private
    /// access only; operator-supplied, never hardcoded.
    #[serde(default)]
    pub endpoint_allow_cidrs: Vec<String>,

    /// An admin role mapped into the cluster's auth config.
    #[serde(default)]
    pub admin_role: Option<ValueRef>,

    /// Managed node capacity provisioned with the cluster. Zero when node
    /// provisioning is delegated to an autoscaler release.
    #[serde(default)]
    pub default_capacity: u32,
}

/// A package-manager (chart) release installed into a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseSpec {
    /// Chart repository URL.
    pub repository: String,

    /// Chart name.
    pub chart: String,

    /// Release name.
    pub release: String,

    /// Target namespace.
    pub namespace: String,

    /// Pinned chart version; unset uses the repository's latest.
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub create_namespace: bool,

    /// Whether the installer blocks until the release is healthy. Passed
    /// through to the installer opaquely.
    #[serde(default = "default_true")]
    pub wait: bool,

    /// Roll the release back if the install fails.
    #[serde(default)]
    pub atomic: bool,

    /// Installer-side timeout, passed through opaquely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Chart values, opaque to the engine.
    #[serde(default)]
    pub values: serde_json::Value,

    /// The cluster to install into.
    pub cluster: ValueRef,

    /// Least-privilege workload identity this release runs as; expanded
    /// into a synthetic binding unit at graph build.
    #[serde(default)]
    pub service_account: Option<BindingRequest>,
}

fn default_true() -> bool {
    true
}

/// A raw cluster-scoped object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// The cluster to apply the manifest to.
    pub cluster: ValueRef,

    /// The object manifest, opaque to the engine.
    pub manifest: serde_json::Value,

    /// Workload identity for the object, if it needs elevated access.
    #[serde(default)]
    pub service_account: Option<BindingRequest>,
}

/// An externally-stored secret reference. The value itself is sourced
/// out-of-band; descriptors never carry secret material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretStoreSpec {
    /// Name of the secret in the external store, e.g. `hf/creds`.
    pub secret_name: String,

    #[serde(default)]
    pub description: String,

    /// Where the value is sourced from (environment variable name,
    /// parameter path), resolved by the provider.
    pub value_from: String,
}

/// One permitted resource/action pair set for a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub resources: Vec<String>,
    pub actions: Vec<String>,
}

/// A binding requirement declared on a release or cluster object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRequest {
    /// Namespace for the workload account.
    pub namespace: String,

    /// Account name, e.g. `aws-load-balancer-controller`.
    pub account_name: String,

    /// Fine-grained permitted actions.
    #[serde(default)]
    pub rules: Vec<AccessRule>,

    /// Coarse-grained managed policies attached to the trust role.
    #[serde(default)]
    pub managed_policies: Vec<String>,
}

/// The payload of a synthetic identity-binding unit.
///
/// Created by the graph builder from a [`BindingRequest`]; inherits the
/// consumer's cluster reference so the binding orders after the cluster
/// through ordinary implicit-edge inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub namespace: String,
    pub account_name: String,
    #[serde(default)]
    pub rules: Vec<AccessRule>,
    #[serde(default)]
    pub managed_policies: Vec<String>,
    pub cluster: ValueRef,
}

impl BindingSpec {
    /// Build a binding payload from a consumer's request and its cluster
    /// reference.
    pub fn from_request(request: &BindingRequest, cluster: ValueRef) -> Self {
        Self {
            namespace: request.namespace.clone(),
            account_name: request.account_name.clone(),
            rules: request.rules.clone(),
            managed_policies: request.managed_policies.clone(),
            cluster,
        }
    }
}

/// The kind-tagged configuration payload of a resource unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSpec {
    Network(NetworkSpec),
    IdentityTrust(TrustSpec),
    ManagedCluster(ClusterSpec),
    PackageRelease(ReleaseSpec),
    ClusterObject(ObjectSpec),
    SecretStore(SecretStoreSpec),
    IdentityBinding(BindingSpec),
}

impl UnitSpec {
    /// The kind tag for this payload.
    pub fn kind(&self) -> ResourceKind {
        match self {
            UnitSpec::Network(_) => ResourceKind::Network,
            UnitSpec::IdentityTrust(_) => ResourceKind::IdentityTrust,
            UnitSpec::ManagedCluster(_) => ResourceKind::ManagedCluster,
            UnitSpec::PackageRelease(_) => ResourceKind::PackageRelease,
            UnitSpec::ClusterObject(_) => ResourceKind::ClusterObject,
            UnitSpec::SecretStore(_) => ResourceKind::SecretStore,
            UnitSpec::IdentityBinding(_) => ResourceKind::IdentityBinding,
        }
    }

    /// All data-flow references in the payload, in declaration order.
    ///
    /// This is the static input side of implicit-edge inference.
    pub fn value_refs(&self) -> Vec<&ValueRef> {
        match self {
            UnitSpec::Network(_) | UnitSpec::IdentityTrust(_) | UnitSpec::SecretStore(_) => {
                Vec::new()
            }
            UnitSpec::ManagedCluster(spec) => {
                let mut refs = vec![&spec.network];
                if let Some(admin) = &spec.admin_role {
                    refs.push(admin);
                }
                refs
            }
            UnitSpec::PackageRelease(spec) => vec![&spec.cluster],
            UnitSpec::ClusterObject(spec) => vec![&spec.cluster],
            UnitSpec::IdentityBinding(spec) => vec![&spec.cluster],
        }
    }

    /// The binding requirement, for kinds that can carry one.
    pub fn service_account(&self) -> Option<&BindingRequest> {
        match self {
            UnitSpec::PackageRelease(spec) => spec.service_account.as_ref(),
            UnitSpec::ClusterObject(spec) => spec.service_account.as_ref(),
            _ => None,
        }
    }

    /// The cluster reference, for kinds applied into a cluster.
    pub fn cluster_ref(&self) -> Option<&ValueRef> {
        match self {
            UnitSpec::PackageRelease(spec) => Some(&spec.cluster),
            UnitSpec::ClusterObject(spec) => Some(&spec.cluster),
            UnitSpec::IdentityBinding(spec) => Some(&spec.cluster),
            _ => None,
        }
    }

    /// Validate required payload fields. Pure; called from
    /// [`crate::ResourceUnit::validate`].
    pub(crate) fn validate(&self, unit: &str) -> Result<(), ConfigurationError> {
        match self {
            UnitSpec::Network(spec) => {
                require(unit, "cidr", &spec.cidr)?;
                if !spec.cidr.contains('/') {
                    return Err(ConfigurationError::invalid(
                        unit,
                        "cidr",
                        "expected CIDR notation like 10.0.0.0/16",
                    ));
                }
                if spec.max_zones == 0 {
                    return Err(ConfigurationError::invalid(
                        unit,
                        "max_zones",
                        "must be at least 1",
                    ));
                }
                Ok(())
            }
            UnitSpec::IdentityTrust(TrustSpec::Role { principal_arn, .. }) => {
                require(unit, "principal_arn", principal_arn)
            }
            UnitSpec::IdentityTrust(TrustSpec::Oidc {
                issuer_url,
                audience,
                subject_pattern,
                ..
            }) => {
                require(unit, "issuer_url", issuer_url)?;
                require(unit, "audience", audience)?;
                require(unit, "subject_pattern", subject_pattern)
            }
            UnitSpec::ManagedCluster(spec) => require(unit, "version", &spec.version),
            UnitSpec::PackageRelease(spec) => {
                require(unit, "repository", &spec.repository)?;
                require(unit, "chart", &spec.chart)?;
                require(unit, "release", &spec.release)?;
                require(unit, "namespace", &spec.namespace)?;
                if let Some(request) = &spec.service_account {
                    validate_binding(unit, request)?;
                }
                Ok(())
            }
            UnitSpec::ClusterObject(spec) => {
                if !spec.manifest.is_object() {
                    return Err(ConfigurationError::invalid(
                        unit,
                        "manifest",
                        "must be a JSON object",
                    ));
                }
                if let Some(request) = &spec.service_account {
                    validate_binding(unit, request)?;
                }
                Ok(())
            }
            UnitSpec::SecretStore(spec) => {
                require(unit, "secret_name", &spec.secret_name)?;
                require(unit, "value_from", &spec.value_from)
            }
            UnitSpec::IdentityBinding(spec) => {
                require(unit, "namespace", &spec.namespace)?;
                require(unit, "account_name", &spec.account_name)
            }
        }
    }
}

fn require(unit: &str, field: &'static str, value: &str) -> Result<(), ConfigurationError> {
    if value.trim().is_empty() {
        return Err(ConfigurationError::missing(unit, field));
    }
    Ok(())
}

fn validate_binding(unit: &str, request: &BindingRequest) -> Result<(), ConfigurationError> {
    require(unit, "service_account.namespace", &request.namespace)?;
    require(unit, "service_account.account_name", &request.account_name)?;
    for rule in &request.rules {
        if rule.resources.is_empty() || rule.actions.is_empty() {
            return Err(ConfigurationError::invalid(
                unit,
                "service_account.rules",
                "each rule needs at least one resource and one action",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_requires_cidr_notation() {
        let spec = UnitSpec::Network(NetworkSpec {
            cidr: "10.0.0.0".to_string(),
            max_zones: 2,
            nat_gateways: 1,
            subnet_tags: BTreeMap::new(),
        });
        assert!(matches!(
            spec.validate("vpc"),
            Err(ConfigurationError::InvalidField { field: "cidr", .. })
        ));
    }

    #[test]
    fn release_requires_chart_coordinates() {
        let spec = UnitSpec::PackageRelease(ReleaseSpec {
            repository: "https://aws.github.io/eks-charts".to_string(),
            chart: String::new(),
            release: "aws-load-balancer-controller".to_string(),
            namespace: "kube-system".to_string(),
            version: None,
            create_namespace: false,
            wait: true,
            atomic: true,
            timeout_secs: None,
            values: serde_json::Value::Null,
            cluster: ValueRef::output("eks/endpoint"),
            service_account: None,
        });
        assert!(matches!(
            spec.validate("alb"),
            Err(ConfigurationError::MissingField { field: "chart", .. })
        ));
    }

    #[test]
    fn value_refs_cover_cluster_and_admin_role() {
        let spec = UnitSpec::ManagedCluster(ClusterSpec {
            version: "1.32".to_string(),
            network: ValueRef::output("vpc/id"),
            endpoint_allow_cidrs: vec!["198.51.100.7/32".to_string()],
            admin_role: Some(ValueRef::output("kube-admin/role-arn")),
            default_capacity: 0,
        });
        let keys: Vec<_> = spec
            .value_refs()
            .into_iter()
            .filter_map(ValueRef::as_output)
            .map(|k| k.as_str().to_string())
            .collect();
        assert_eq!(keys, vec!["vpc/id", "kube-admin/role-arn"]);
    }

    #[test]
    fn empty_rule_is_rejected() {
        let request = BindingRequest {
            namespace: "kube-system".to_string(),
            account_name: "alb-sa".to_string(),
            rules: vec![AccessRule {
                resources: vec!["*".to_string()],
                actions: vec![],
            }],
            managed_policies: vec![],
        };
        assert!(validate_binding("alb", &request).is_err());
    }
}
