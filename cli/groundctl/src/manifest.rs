//! Plan manifest parsing and hashing.
//!
//! v1 contract: a TOML file with `schema_version = "v1"`, one `[[unit]]`
//! table per resource unit (name, kind payload, optional edges and
//! readiness override) and an optional `[handoff]` table naming the output
//! keys the post-convergence handoff is assembled from. The plan hash is
//! computed from a canonicalized representation of the TOML so formatting
//! and table order do not matter.

use std::path::Path;

use anyhow::{Context, Result};
use groundwork_engine::HandoffSpec;
use groundwork_model::{OutputKey, ReadinessPolicy, ResourceUnit, UnitName, UnitSpec};
use serde::Deserialize;
use sha2::{Digest, Sha256};

pub const SCHEMA_VERSION: &str = "v1";

/// One `[[unit]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitEntry {
    pub name: UnitName,
    #[serde(default)]
    pub depends_on: Vec<UnitName>,
    #[serde(default)]
    pub produces: Vec<OutputKey>,
    /// Overrides the kind's default policy when present.
    #[serde(default)]
    pub readiness: Option<ReadinessPolicy>,
    pub spec: UnitSpec,
}

impl UnitEntry {
    fn into_unit(self) -> ResourceUnit {
        let mut unit = ResourceUnit::new(self.name, self.spec)
            .depends_on(self.depends_on)
            .produces(self.produces);
        if let Some(policy) = self.readiness {
            unit = unit.readiness(policy);
        }
        unit
    }
}

/// The parsed plan file.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanManifest {
    pub schema_version: String,
    #[serde(default, rename = "unit")]
    pub units: Vec<UnitEntry>,
    #[serde(default)]
    pub handoff: Option<HandoffSpec>,
}

impl PlanManifest {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let manifest: PlanManifest = toml::from_str(contents).context("invalid plan TOML")?;
        if manifest.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "unsupported schema_version '{}' (expected '{}')",
                manifest.schema_version,
                SCHEMA_VERSION
            );
        }
        if manifest.units.is_empty() {
            anyhow::bail!("plan declares no [[unit]] entries");
        }
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read plan: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("failed to parse plan: {}", path.display()))
    }

    pub fn into_units(self) -> Vec<ResourceUnit> {
        self.units.into_iter().map(UnitEntry::into_unit).collect()
    }
}

pub fn plan_hash_from_toml_str(contents: &str) -> Result<String> {
    let value: toml::Value = toml::from_str(contents).context("invalid plan TOML")?;
    if !value.is_table() {
        anyhow::bail!("plan must be a TOML table (key/value pairs at top-level)");
    }

    let json_value = serde_json::to_value(&value).context("failed to canonicalize plan")?;
    let canonical_json =
        serde_json::to_vec(&json_value).context("failed to serialize plan for hashing")?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical_json);
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

pub fn plan_hash_from_path(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan: {}", path.display()))?;
    plan_hash_from_toml_str(&contents)
        .with_context(|| format!("failed to compute plan hash: {}", path.display()))
}
