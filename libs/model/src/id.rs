//! Run identifiers.
//!
//! Every apply run gets one `run_<ULID>` id: prefixed for readability, ULID
//! so ids sort by start time. Parsing is strict and roundtrips.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use ulid::Ulid;

/// Errors raised when parsing a run id.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunIdError {
    /// The id string is empty.
    #[error("run id cannot be empty")]
    Empty,

    /// The id is missing the underscore separator.
    #[error("run id missing underscore separator")]
    MissingSeparator,

    /// The id has the wrong prefix.
    #[error("invalid run id prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The ULID portion is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),
}

/// Identifier for one apply run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(Ulid);

impl RunId {
    /// The prefix for run ids.
    pub const PREFIX: &'static str = "run";

    /// Create a fresh run id.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse a run id from its `run_<ULID>` form.
    pub fn parse(s: &str) -> Result<Self, RunIdError> {
        if s.is_empty() {
            return Err(RunIdError::Empty);
        }
        let Some((prefix, ulid_str)) = s.split_once('_') else {
            return Err(RunIdError::MissingSeparator);
        };
        if prefix != Self::PREFIX {
            return Err(RunIdError::InvalidPrefix {
                expected: Self::PREFIX,
                actual: prefix.to_string(),
            });
        }
        let ulid = ulid_str
            .parse::<Ulid>()
            .map_err(|e| RunIdError::InvalidUlid(e.to_string()))?;
        Ok(Self(ulid))
    }

    /// The timestamp portion of the id in milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", Self::PREFIX, self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = RunIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RunId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}
