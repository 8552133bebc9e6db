//! Lookup Key Value Object
//!
//! The identifier typed into a login form: a username for admins, an
//! email address for mentors, a profile name for projects.
//!
//! ## Normalization
//! - NFKC, then trim
//! - `original` keeps the caller's case for display and audit
//! - `canonical` is lowercase; credential lookup and failure counting
//!   both use it, so `Alice` and `alice` share one lockout counter

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Maximum length (in characters) after normalization
pub const LOOKUP_KEY_MAX_LENGTH: usize = 255;

/// Error returned when a lookup key is malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKeyError {
    /// Empty after trimming
    Empty,

    /// Longer than LOOKUP_KEY_MAX_LENGTH
    TooLong { length: usize, max: usize },

    /// Contains a control character
    ControlCharacter,
}

impl fmt::Display for LookupKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Please enter your login name."),
            Self::TooLong { length, max } => {
                write!(f, "Login name is too long ({length} chars, maximum {max})")
            }
            Self::ControlCharacter => write!(f, "Login name contains invalid characters"),
        }
    }
}

impl std::error::Error for LookupKeyError {}

/// Normalized login identifier
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LookupKey {
    original: String,
    canonical: String,
}

impl LookupKey {
    pub fn new(input: impl AsRef<str>) -> Result<Self, LookupKeyError> {
        let original = input
            .as_ref()
            .nfkc()
            .collect::<String>()
            .trim()
            .to_string();

        if original.is_empty() {
            return Err(LookupKeyError::Empty);
        }

        let length = original.chars().count();
        if length > LOOKUP_KEY_MAX_LENGTH {
            return Err(LookupKeyError::TooLong {
                length,
                max: LOOKUP_KEY_MAX_LENGTH,
            });
        }

        if original.chars().any(char::is_control) {
            return Err(LookupKeyError::ControlCharacter);
        }

        let canonical = original.to_lowercase();
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Rebuild from a stored value (already validated when written)
    pub fn from_db(original: &str) -> Self {
        Self {
            original: original.to_string(),
            canonical: original.to_lowercase(),
        }
    }

    /// As typed (trimmed, NFKC)
    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Lowercase form used for matching
    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl TryFrom<String> for LookupKey {
    type Error = LookupKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LookupKey> for String {
    fn from(key: LookupKey) -> Self {
        key.original
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl fmt::Debug for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LookupKey").field(&self.original).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_and_canonical() {
        let key = LookupKey::new("  Bob@X.com ").unwrap();
        assert_eq!(key.original(), "Bob@X.com");
        assert_eq!(key.canonical(), "bob@x.com");
    }

    #[test]
    fn test_case_variants_share_canonical() {
        let a = LookupKey::new("Alice").unwrap();
        let b = LookupKey::new("alice").unwrap();
        assert_eq!(a.canonical(), b.canonical());
        assert_ne!(a, b);
    }

    #[test]
    fn test_nfkc_fullwidth() {
        let key = LookupKey::new("ａｌｉｃｅ").unwrap();
        assert_eq!(key.canonical(), "alice");
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(LookupKey::new("").unwrap_err(), LookupKeyError::Empty);
        assert_eq!(LookupKey::new("   ").unwrap_err(), LookupKeyError::Empty);
    }

    #[test]
    fn test_too_long_rejected() {
        let err = LookupKey::new("a".repeat(LOOKUP_KEY_MAX_LENGTH + 1)).unwrap_err();
        assert!(matches!(err, LookupKeyError::TooLong { .. }));
        assert!(LookupKey::new("a".repeat(LOOKUP_KEY_MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_control_character_rejected() {
        assert_eq!(
            LookupKey::new("ali\u{0007}ce").unwrap_err(),
            LookupKeyError::ControlCharacter
        );
    }

    #[test]
    fn test_serde_round_trip_keeps_original() {
        let key: LookupKey = serde_json::from_str("\"Alice\"").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"Alice\"");
        assert!(serde_json::from_str::<LookupKey>("\"  \"").is_err());
    }
}
