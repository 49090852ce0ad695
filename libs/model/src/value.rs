//! Produced identifiers and data-flow references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A produced-output identifier, e.g. `vpc/id` or `eks/endpoint`.
///
/// Keys are free-form strings; at most one unit in a graph may claim a
/// given key. A payload field that references a key creates an implicit
/// dependency edge onto the producing unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputKey(String);

impl OutputKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for OutputKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OutputKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for OutputKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The values a unit published when it became ready, keyed by [`OutputKey`].
pub type Outputs = BTreeMap<OutputKey, String>;

/// A payload value that is either a literal or another unit's output.
///
/// In a plan manifest this is written as `{ literal = "10.0.0.0/16" }` or
/// `{ output = "vpc/id" }`. Output references are the sole source of
/// implicit edges, so they must be visible without executing anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRef {
    /// A literal value supplied by the plan author.
    Literal(String),
    /// A reference to an output another unit produces.
    Output(OutputKey),
}

impl ValueRef {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn output(key: impl Into<OutputKey>) -> Self {
        Self::Output(key.into())
    }

    /// The referenced output key, if this is a reference.
    pub fn as_output(&self) -> Option<&OutputKey> {
        match self {
            ValueRef::Literal(_) => None,
            ValueRef::Output(key) => Some(key),
        }
    }

    /// Resolve against published outputs. Literals resolve to themselves.
    pub fn resolve<'a>(&'a self, outputs: &'a Outputs) -> Option<&'a str> {
        match self {
            ValueRef::Literal(v) => Some(v),
            ValueRef::Output(key) => outputs.get(key).map(String::as_str),
        }
    }
}
