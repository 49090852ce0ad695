//! The resource unit descriptor.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{ConfigurationError, OutputKey, ReadinessPolicy, ResourceKind, UnitName, UnitSpec};

/// One declaratively specified provisionable unit.
///
/// A pure value object: the scheduler treats the payload as opaque and only
/// looks at the name, kind, dependency references, produced identifiers and
/// readiness policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUnit {
    /// Stable name, unique within a deployment.
    pub name: UnitName,

    /// Kind-tagged configuration payload.
    pub spec: UnitSpec,

    /// Explicitly declared dependencies, by name.
    #[serde(default)]
    pub depends_on: Vec<UnitName>,

    /// Output identifiers this unit claims to produce.
    #[serde(default)]
    pub produces: Vec<OutputKey>,

    /// How readiness is decided for this unit.
    #[serde(default)]
    pub readiness: ReadinessPolicy,
}

impl ResourceUnit {
    /// Create a unit with the kind's default readiness policy.
    pub fn new(name: UnitName, spec: UnitSpec) -> Self {
        let readiness = ReadinessPolicy::default_for(spec.kind());
        Self {
            name,
            spec,
            depends_on: Vec::new(),
            produces: Vec::new(),
            readiness,
        }
    }

    /// Add explicit dependencies.
    pub fn depends_on(mut self, deps: impl IntoIterator<Item = UnitName>) -> Self {
        self.depends_on.extend(deps);
        self
    }

    /// Declare produced output identifiers.
    pub fn produces(mut self, keys: impl IntoIterator<Item = OutputKey>) -> Self {
        self.produces.extend(keys);
        self
    }

    /// Override the readiness policy.
    pub fn readiness(mut self, policy: ReadinessPolicy) -> Self {
        self.readiness = policy;
        self
    }

    /// The unit's kind tag.
    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }

    /// Construction-time validation. Pure, no side effects.
    ///
    /// Cross-unit checks (dangling references, duplicate producers) belong
    /// to the graph builder; this covers everything visible from one
    /// descriptor alone.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.depends_on.contains(&self.name) {
            return Err(ConfigurationError::SelfDependency {
                unit: self.name.to_string(),
            });
        }
        let mut seen = HashSet::new();
        for key in &self.produces {
            if key.is_empty() {
                return Err(ConfigurationError::invalid(
                    self.name.as_str(),
                    "produces",
                    "output key cannot be empty",
                ));
            }
            if !seen.insert(key) {
                return Err(ConfigurationError::DuplicateOutput {
                    unit: self.name.to_string(),
                    key: key.to_string(),
                });
            }
        }
        self.spec.validate(self.name.as_str())
    }

    /// The output identifiers this unit consumes, derived statically from
    /// the payload's [`crate::ValueRef`] fields.
    pub fn consumes(&self) -> BTreeSet<OutputKey> {
        self.spec
            .value_refs()
            .into_iter()
            .filter_map(|r| r.as_output())
            .cloned()
            .collect()
    }

    /// Canonical sha256 hash of the descriptor, for change detection and
    /// logging. Stable across field ordering.
    pub fn spec_hash(&self) -> String {
        let value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        let canonical = serde_json::to_vec(&sort_keys(value)).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        let digest = hasher.finalize();
        format!("sha256:{}", hex::encode(&digest[..16]))
    }
}

/// Rebuild a JSON value with object keys in sorted order so serialization
/// is canonical.
fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(String, serde_json::Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_keys).collect())
        }
        other => other,
    }
}
