//! Attributes, record identifiers, and scoping contexts.

use std::fmt;

use crate::constants::WILDCARD;

/// A (key, value) pair stored in the attribute store.
///
/// The value `*` acts as a wildcard when the attribute is used as a
/// query pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    key: String,
    value: String,
}

impl Attribute {
    /// Creates an attribute.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a pattern matching every value stored under `key`.
    #[must_use]
    pub fn any(key: impl Into<String>) -> Self {
        Self::new(key, WILDCARD)
    }

    /// Creates a pattern matching every attribute.
    #[must_use]
    pub fn everything() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    /// Returns the key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consumes the attribute, returning its value.
    #[must_use]
    pub fn into_value(self) -> String {
        self.value
    }

    /// Returns true if `other` is matched by this attribute used as a pattern.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        (self.key == WILDCARD || self.key == other.key)
            && (self.value == WILDCARD || self.value == other.value)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Opaque identifier of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rid(u64);

impl Rid {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scoping token restricting store operations to one record.
///
/// Store operations take `Option<Context>`; `None` addresses the unscoped
/// attributes, which are the record identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Context {
    rid: Rid,
}

impl Context {
    /// Scopes operations to `rid`.
    #[must_use]
    pub const fn of(rid: Rid) -> Self {
        Self { rid }
    }

    /// Returns the scoped record.
    #[must_use]
    pub const fn rid(self) -> Rid {
        self.rid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_value_matches_any_value() {
        let pattern = Attribute::any("host");
        assert!(pattern.matches(&Attribute::new("host", "10.0.0.2")));
        assert!(!pattern.matches(&Attribute::new("socket", "10002")));
    }

    #[test]
    fn exact_pattern_matches_only_itself() {
        let pattern = Attribute::new("yarprun", "true");
        assert!(pattern.matches(&Attribute::new("yarprun", "true")));
        assert!(!pattern.matches(&Attribute::new("yarprun", "false")));
    }

    #[test]
    fn everything_matches_all_keys() {
        assert!(Attribute::everything().matches(&Attribute::new("owns", "/child")));
    }

    #[test]
    fn context_wraps_rid() {
        let rid = Rid::new(7);
        assert_eq!(Context::of(rid).rid(), rid);
        assert_eq!(rid.to_string(), "#7");
    }
}
