//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//!
//! Every method is a single call with no internal retry; a storage failure
//! comes back as `AuthError::StorageUnavailable`.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::entity::{
    activity::ActivityEvent, auth_session::AuthSession, failed_attempt::FailedAttempt,
    identity::Identity,
};
use crate::domain::value_object::{IdentityId, LookupKey, Role, SessionId};
use crate::error::AuthResult;

/// Read access to the three identity tables
#[trait_variant::make(CredentialStore: Send)]
pub trait LocalCredentialStore {
    /// Find an active identity by its canonical lookup key
    async fn find_identity(&self, role: Role, key: &LookupKey) -> AuthResult<Option<Identity>>;

    /// Replace a stored password hash (legacy hash upgrade)
    async fn replace_password_hash(
        &self,
        role: Role,
        id: IdentityId,
        hash: &HashedPassword,
    ) -> AuthResult<()>;

    /// Stamp the last successful login
    async fn touch_last_login(
        &self,
        role: Role,
        id: IdentityId,
        at: DateTime<Utc>,
    ) -> AuthResult<()>;
}

/// Auth session repository trait
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Create a new session
    async fn create(&self, session: &AuthSession) -> AuthResult<()>;

    /// Find session by its current ID, or by the ID it had before its
    /// latest rotation
    async fn find_by_id(&self, session_id: SessionId) -> AuthResult<Option<AuthSession>>;

    /// Persist last activity
    async fn update(&self, session: &AuthSession) -> AuthResult<()>;

    /// Move the record stored under `old_id` to `session.session_id`,
    /// remembering `old_id` as its previous id. Returns `false` when no
    /// record was current under `old_id` (another request rotated first).
    async fn rotate(&self, old_id: SessionId, session: &AuthSession) -> AuthResult<bool>;

    /// Delete a session. Deleting a missing session is not an error.
    async fn delete(&self, session_id: SessionId) -> AuthResult<()>;

    /// Delete sessions idle since before `idle_before`
    async fn cleanup_expired(&self, idle_before: DateTime<Utc>) -> AuthResult<u64>;
}

/// Append-only record of failed logins
#[trait_variant::make(AttemptLedger: Send)]
pub trait LocalAttemptLedger {
    async fn record_failure(&self, attempt: &FailedAttempt) -> AuthResult<()>;

    /// Failures for exactly `(role, key.canonical())` strictly after `since`
    async fn count_recent_failures(
        &self,
        role: Role,
        key: &LookupKey,
        since: DateTime<Utc>,
    ) -> AuthResult<u32>;
}

/// Shared audit sink
#[trait_variant::make(ActivityLog: Send)]
pub trait LocalActivityLog {
    async fn append(&self, event: &ActivityEvent) -> AuthResult<()>;
}

/// Everything the auth service needs from storage
pub trait AuthRepository:
    CredentialStore + SessionStore + AttemptLedger + ActivityLog + Send + Sync + 'static
{
}

impl<T> AuthRepository for T where
    T: CredentialStore + SessionStore + AttemptLedger + ActivityLog + Send + Sync + 'static
{
}
