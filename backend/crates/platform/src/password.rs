//! Password Hashing and Verification
//!
//! Argon2id password handling with:
//! - Salted, memory-hard hashing (PHC string format)
//! - Optional application-wide pepper
//! - Zeroization of clear text and peppered buffers
//! - A dummy-hash verification path so that an unknown account costs the
//!   same hashing work as a wrong password
//! - Verification (never creation) of legacy bcrypt hashes, which callers
//!   upgrade after a successful login

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Minimum length for newly hashed passwords
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length; bounds the hashing work per request
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Policy(#[from] PasswordPolicyError),
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// - Does not implement `Clone`
/// - Debug output is redacted
/// - Unicode is NFKC-normalized so the same password typed on different
///   keyboards hashes identically
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Accept a password as typed into a login form.
    ///
    /// Only structural checks apply here (non-empty, bounded length, no
    /// control characters). Strength rules are enforced by
    /// [`PasswordHasher::hash`] when a new hash is produced.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let mut raw = raw;
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        Ok(Self(normalized))
    }

    fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(self.0.as_bytes().to_vec());
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        bytes
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Wrap a hash loaded from storage.
    ///
    /// The string is not validated here; a malformed hash simply never
    /// verifies, which keeps "broken row" indistinguishable from "wrong
    /// password" for the caller.
    pub fn from_stored(s: impl Into<String>) -> Self {
        Self { hash: s.into() }
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// bcrypt hash (`$2a$`, `$2b$`, `$2x$` or `$2y$`) from the previous scheme
    pub fn is_legacy_bcrypt(&self) -> bool {
        ["$2a$", "$2b$", "$2x$", "$2y$"]
            .iter()
            .any(|prefix| self.hash.starts_with(prefix))
    }

    /// Whether the hash should be recomputed (not Argon2id, or unparsable)
    pub fn needs_rehash(&self) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => parsed.algorithm != Algorithm::Argon2id.ident(),
            Err(_) => true,
        }
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// Argon2id hasher with an optional pepper
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    pepper: Option<Zeroizing<Vec<u8>>>,
    dummy: HashedPassword,
}

impl PasswordHasher {
    /// Hasher with OWASP-recommended defaults (m=19456 KiB, t=2, p=1)
    pub fn new(pepper: Option<Vec<u8>>) -> Result<Self, PasswordHashError> {
        Self::build(Params::default(), pepper)
    }

    /// Hasher with explicit cost parameters (memory in KiB, iterations, lanes)
    pub fn with_cost(
        m_cost: u32,
        t_cost: u32,
        p_cost: u32,
        pepper: Option<Vec<u8>>,
    ) -> Result<Self, PasswordHashError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;
        Self::build(params, pepper)
    }

    fn build(params: Params, pepper: Option<Vec<u8>>) -> Result<Self, PasswordHashError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let pepper = pepper.map(Zeroizing::new);

        // Hash of a random secret nobody knows; verified against when the
        // account does not exist.
        let secret = Zeroizing::new(crate::crypto::random_token_hex(16));
        let dummy = hash_bytes(&argon2, secret.as_bytes())?;

        Ok(Self {
            argon2,
            pepper,
            dummy,
        })
    }

    /// Hash a new password. Enforces [`MIN_PASSWORD_LENGTH`].
    pub fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        let actual = password.char_count();
        if actual < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual,
            }
            .into());
        }

        let bytes = password.peppered(self.pepper.as_deref().map(Vec::as_slice));
        hash_bytes(&self.argon2, &bytes)
    }

    /// Verify a password against a stored hash.
    ///
    /// Parameters (memory, iterations) are read from the hash itself, so
    /// hashes created under older cost settings still verify. Legacy bcrypt
    /// hashes were never peppered and are checked against the bare password.
    pub fn verify(&self, password: &ClearTextPassword, hash: &HashedPassword) -> bool {
        if hash.is_legacy_bcrypt() {
            return bcrypt::verify(password.0.as_bytes(), &hash.hash).unwrap_or(false);
        }

        let Ok(parsed) = PasswordHash::new(&hash.hash) else {
            return false;
        };
        let bytes = password.peppered(self.pepper.as_deref().map(Vec::as_slice));

        self.argon2.verify_password(&bytes, &parsed).is_ok()
    }

    /// Spend one verification's worth of work against the dummy hash.
    /// Always returns `false` for practical purposes.
    pub fn verify_dummy(&self, password: &ClearTextPassword) -> bool {
        self.verify(password, &self.dummy)
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn hash_bytes(argon2: &Argon2<'_>, bytes: &[u8]) -> Result<HashedPassword, PasswordHashError> {
    let salt = SaltString::generate(OsRng);
    let hash = argon2
        .hash_password(bytes, &salt)
        .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

    Ok(HashedPassword {
        hash: hash.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
