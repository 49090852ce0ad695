//! Validated unit names.

use serde::{Deserialize, Serialize};

use crate::ConfigurationError;

/// The stable name of a resource unit, unique within one deployment graph.
///
/// Names are lowercase DNS-label style: `[a-z0-9]` plus `-`, `_` and `.`,
/// starting with an alphanumeric, at most 63 characters. The lexical order
/// of names is the deterministic tie-break for simultaneously-eligible
/// units, so `Ord` here is load-bearing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitName(String);

const MAX_LEN: usize = 63;

impl UnitName {
    /// Validate and wrap a unit name.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        if name.len() > MAX_LEN {
            return Err(ConfigurationError::InvalidName {
                name,
                reason: format!("longer than {MAX_LEN} characters"),
            });
        }
        let mut chars = name.chars();
        let first = chars.next().unwrap_or('-');
        if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
            return Err(ConfigurationError::InvalidName {
                name,
                reason: "must start with a lowercase letter or digit".to_string(),
            });
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && !"-_.".contains(*c))
        {
            return Err(ConfigurationError::InvalidName {
                name,
                reason: format!("character '{bad}' is not allowed"),
            });
        }
        Ok(Self(name))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the name of the synthetic binding unit for this unit.
    ///
    /// The suffix keeps the derived name valid and collision-checkable at
    /// graph build time.
    pub fn binding_name(&self) -> Result<Self, ConfigurationError> {
        Self::new(format!("{}-binding", self.0))
    }
}

impl std::fmt::Display for UnitName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UnitName {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UnitName {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UnitName> for String {
    fn from(value: UnitName) -> Self {
        value.0
    }
}

impl AsRef<str> for UnitName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
