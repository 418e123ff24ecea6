//! Internal implementation of the canonical record identifier.

use crate::{IdError, IdResult};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Simward's canonical record identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is guaranteed to be in canonical
/// form, so it can be used directly as a map key, wire value, or path
/// component.
///
/// # Construction
/// - [`RecordId::new`] generates a fresh identifier (for newly created records).
/// - [`RecordId::parse`] validates an externally supplied identifier.
///
/// # Display format
/// Displaying or serialising a `RecordId` always produces the canonical
/// 32-character lowercase hex form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Uuid);

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordId {
    /// Generates a new identifier in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// This does **not** normalise other common UUID forms (hyphenated or
    /// uppercase); callers must provide the canonical representation.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` is not 32 lowercase hex
    /// characters.
    pub fn parse(input: &str) -> IdResult<Self> {
        if Self::is_canonical(input) {
            // SAFETY: is_canonical guarantees valid hex, so parse_str will succeed
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(IdError::InvalidInput(format!(
            "record id must be 32 lowercase hex characters without hyphens, got: '{}'",
            input
        )))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 32 bytes, lowercase hex only.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_canonical() {
        let id = RecordId::new();
        let text = id.to_string();
        assert!(RecordId::is_canonical(&text));
        assert_eq!(RecordId::parse(&text).unwrap(), id);
    }

    #[test]
    fn parse_rejects_non_canonical_forms() {
        // hyphenated
        assert!(RecordId::parse("550e8400-e29b-41d4-a716-446655440000").is_err());
        // uppercase
        assert!(RecordId::parse("550E8400E29B41D4A716446655440000").is_err());
        // wrong length
        assert!(RecordId::parse("550e8400").is_err());
        // non-hex
        assert!(RecordId::parse("550e8400e29b41d4a716446655440zzz").is_err());
    }

    #[test]
    fn serde_round_trips_as_string() {
        let id = RecordId::parse("550e8400e29b41d4a716446655440000").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400e29b41d4a716446655440000\"");
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
