//! Graph-build errors. All fatal: no partial apply is ever attempted.

use groundwork_model::{ConfigurationError, OutputKey, UnitName};
use thiserror::Error;

/// Errors raised while assembling a deployment graph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// A descriptor failed construction-time validation.
    #[error(transparent)]
    Invalid(#[from] ConfigurationError),

    /// Two units share the same name.
    #[error("duplicate unit name '{name}'")]
    DuplicateUnit { name: UnitName },

    /// An explicit dependency points at a unit that does not exist.
    #[error("unit '{unit}' depends on unknown unit '{missing}'")]
    DanglingReference { unit: UnitName, missing: UnitName },

    /// Two units claim the same produced identifier.
    #[error("output '{key}' is claimed by both '{first}' and '{second}'")]
    AmbiguousProducer {
        key: OutputKey,
        first: UnitName,
        second: UnitName,
    },

    /// A unit consumes an identifier no unit produces.
    #[error("unit '{unit}' consumes '{key}' but no unit produces it")]
    UnresolvedConsumer { unit: UnitName, key: OutputKey },

    /// The dependency relation contains a cycle.
    #[error("dependency cycle detected: {}", format_cycle(.path))]
    CycleDetected { path: Vec<UnitName> },
}

fn format_cycle(path: &[UnitName]) -> String {
    let mut names: Vec<&str> = path.iter().map(UnitName::as_str).collect();
    if let Some(first) = names.first().copied() {
        names.push(first);
    }
    names.join(" -> ")
}
