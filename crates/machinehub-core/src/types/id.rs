//! Newtype wrapper for machine identifiers.
//!
//! Machine ids are opaque strings assigned by the backend (the fleet mixes
//! numeric ids and human-assigned codes), so the wrapper is string-backed
//! rather than a UUID.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a machine in the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(String);

impl MachineId {
    /// Create an identifier from any string-like value.
    ///
    /// Returns `None` for an empty (or whitespace-only) id; events without
    /// a resolvable machine id are invalid everywhere in the pipeline.
    pub fn parse(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MachineId {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_empty() {
        assert!(MachineId::parse("").is_none());
        assert!(MachineId::parse("   ").is_none());
        assert_eq!(MachineId::parse(" 5 ").unwrap().as_str(), "5");
    }
}
