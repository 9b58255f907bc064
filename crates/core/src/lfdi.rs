//! Long-form device identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest accepted LFDI. The IEEE 2030.5 form is 40 hex characters; the
/// remaining allowance covers prefixed variants.
pub const MAX_LFDI_LEN: usize = 42;

/// A validated LFDI.
///
/// LFDIs are compared exactly; no case folding is applied.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Lfdi(String);

impl Lfdi {
    /// Parse and validate an LFDI, trimming surrounding whitespace.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidLfdi("lfdi must not be empty".to_string()));
        }
        let len = trimmed.chars().count();
        if len > MAX_LFDI_LEN {
            return Err(crate::Error::InvalidLfdi(format!(
                "lfdi is {len} characters, maximum is {MAX_LFDI_LEN}"
            )));
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(crate::Error::InvalidLfdi(format!(
                "lfdi '{trimmed}' contains whitespace"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Lfdi {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(&value)
    }
}

impl From<Lfdi> for String {
    fn from(value: Lfdi) -> Self {
        value.0
    }
}

impl AsRef<str> for Lfdi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Lfdi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lfdi({})", self.0)
    }
}

impl fmt::Display for Lfdi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
