//! Identity handle type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// The unique, user-facing name of a participant.
///
/// Handles are 1..=64 characters drawn from ASCII letters, digits, `_`, `-`
/// and `.`. They are stored and compared exactly as given.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Longest accepted handle, in bytes.
    pub const MAX_LEN: usize = 64;

    /// Validate and wrap a raw handle string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.is_empty() || s.len() > Self::MAX_LEN {
            return Err(TypesError::InvalidHandle(s));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
        if !s.chars().all(allowed) {
            return Err(TypesError::InvalidHandle(s));
        }
        Ok(Self(s))
    }

    /// Return the raw handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Handle {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Handle> for String {
    fn from(h: Handle) -> Self {
        h.0
    }
}

impl std::str::FromStr for Handle {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_handles() {
        for raw in ["alice", "bob_42", "c.d-e", "X"] {
            assert!(Handle::parse(raw).is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(Handle::parse("").is_err());
        assert!(Handle::parse("a".repeat(Handle::MAX_LEN + 1)).is_err());
        assert!(Handle::parse("a".repeat(Handle::MAX_LEN)).is_ok());
    }

    #[test]
    fn rejects_whitespace_and_symbols() {
        assert!(Handle::parse("al ice").is_err());
        assert!(Handle::parse("bob\n").is_err());
        assert!(Handle::parse("eve@example").is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<Handle, _> = serde_json::from_str("\"alice\"");
        assert!(ok.is_ok());
        let bad: Result<Handle, _> = serde_json::from_str("\"not valid\"");
        assert!(bad.is_err());
    }
}
