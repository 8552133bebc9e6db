//! Anti-Forgery Token
//!
//! One per session, generated at login and kept until the session ends.

use platform::crypto::{constant_time_eq, random_token_hex};
use std::fmt;

/// Random bytes behind each token (hex-encoded to twice this length)
pub const ANTI_FORGERY_TOKEN_BYTES: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct AntiForgeryToken(String);

impl AntiForgeryToken {
    pub fn generate() -> Self {
        Self(random_token_hex(ANTI_FORGERY_TOKEN_BYTES))
    }

    /// Wrap a stored token
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a submitted value
    pub fn matches(&self, candidate: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), candidate.as_bytes())
    }
}

impl fmt::Debug for AntiForgeryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AntiForgeryToken([REDACTED])")
    }
}
