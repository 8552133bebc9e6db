//! In-memory repository
//!
//! Implements every repository trait over `RwLock`ed maps. Used by tests
//! and for running the router without a database.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::entity::{
    activity::ActivityEvent, auth_session::AuthSession, failed_attempt::FailedAttempt,
    identity::Identity,
};
use crate::domain::repository::{ActivityLog, AttemptLedger, CredentialStore, SessionStore};
use crate::domain::value_object::{IdentityId, LookupKey, Role, SessionId};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Default)]
pub struct InMemoryAuthRepository {
    identities: RwLock<HashMap<(Role, String), Identity>>,
    sessions: RwLock<HashMap<SessionId, AuthSession>>,
    failures: RwLock<Vec<FailedAttempt>>,
    activity: RwLock<Vec<ActivityEvent>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identity and return its id. Replaces any identity with the
    /// same role and canonical key.
    pub fn insert_identity(
        &self,
        role: Role,
        key: &str,
        password_hash: HashedPassword,
        active: bool,
    ) -> AuthResult<IdentityId> {
        let key = LookupKey::new(key).map_err(|e| AuthError::Validation(e.to_string()))?;
        let id = IdentityId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let identity = Identity::from_parts(role, id, key.clone(), password_hash, active, None);

        write(&self.identities).insert((role, key.canonical().to_string()), identity);
        Ok(id)
    }

    /// Simulate the backing store going away
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    pub fn activity_events(&self) -> Vec<ActivityEvent> {
        read(&self.activity).clone()
    }

    pub fn session_count(&self) -> usize {
        read(&self.sessions).len()
    }

    pub fn identity(&self, role: Role, key: &str) -> Option<Identity> {
        read(&self.identities)
            .get(&(role, key.to_lowercase()))
            .cloned()
    }

    fn check_available(&self) -> AuthResult<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            Err(AuthError::StorageUnavailable(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl CredentialStore for InMemoryAuthRepository {
    async fn find_identity(&self, role: Role, key: &LookupKey) -> AuthResult<Option<Identity>> {
        self.check_available()?;
        Ok(read(&self.identities)
            .get(&(role, key.canonical().to_string()))
            .filter(|identity| identity.is_active())
            .cloned())
    }

    async fn replace_password_hash(
        &self,
        role: Role,
        id: IdentityId,
        hash: &HashedPassword,
    ) -> AuthResult<()> {
        self.check_available()?;
        let mut identities = write(&self.identities);
        let found = identities
            .iter_mut()
            .find(|((r, _), identity)| *r == role && identity.id() == id);

        if let Some((_, identity)) = found {
            match identity {
                Identity::Admin(a) => a.password_hash = hash.clone(),
                Identity::Mentor(m) => m.password_hash = hash.clone(),
                Identity::Project(p) => p.password_hash = hash.clone(),
            }
        }
        Ok(())
    }

    async fn touch_last_login(
        &self,
        role: Role,
        id: IdentityId,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        self.check_available()?;
        let mut identities = write(&self.identities);
        let found = identities
            .iter_mut()
            .find(|((r, _), identity)| *r == role && identity.id() == id);

        if let Some((_, identity)) = found {
            match identity {
                Identity::Admin(a) => a.last_login_at = Some(at),
                Identity::Mentor(m) => m.last_login_at = Some(at),
                Identity::Project(p) => p.last_login_at = Some(at),
            }
        }
        Ok(())
    }
}

impl SessionStore for InMemoryAuthRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()> {
        self.check_available()?;
        write(&self.sessions).insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, session_id: SessionId) -> AuthResult<Option<AuthSession>> {
        self.check_available()?;
        let sessions = read(&self.sessions);
        Ok(sessions
            .get(&session_id)
            .or_else(|| {
                sessions
                    .values()
                    .find(|s| s.previous_session_id == Some(session_id))
            })
            .cloned())
    }

    async fn update(&self, session: &AuthSession) -> AuthResult<()> {
        self.check_available()?;
        // A session deleted concurrently stays deleted
        if let Some(stored) = write(&self.sessions).get_mut(&session.session_id) {
            if session.last_activity_at > stored.last_activity_at {
                stored.last_activity_at = session.last_activity_at;
            }
        }
        Ok(())
    }

    async fn rotate(&self, old_id: SessionId, session: &AuthSession) -> AuthResult<bool> {
        self.check_available()?;
        let mut sessions = write(&self.sessions);
        let Some(stored) = sessions.remove(&old_id) else {
            return Ok(false);
        };

        let mut rotated = session.clone();
        rotated.previous_session_id = Some(old_id);
        rotated.last_activity_at = rotated.last_activity_at.max(stored.last_activity_at);
        sessions.insert(rotated.session_id, rotated);
        Ok(true)
    }

    async fn delete(&self, session_id: SessionId) -> AuthResult<()> {
        self.check_available()?;
        write(&self.sessions).remove(&session_id);
        Ok(())
    }

    async fn cleanup_expired(&self, idle_before: DateTime<Utc>) -> AuthResult<u64> {
        self.check_available()?;
        let mut sessions = write(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, s| s.last_activity_at >= idle_before);
        Ok((before - sessions.len()) as u64)
    }
}

impl AttemptLedger for InMemoryAuthRepository {
    async fn record_failure(&self, attempt: &FailedAttempt) -> AuthResult<()> {
        self.check_available()?;
        write(&self.failures).push(attempt.clone());
        Ok(())
    }

    async fn count_recent_failures(
        &self,
        role: Role,
        key: &LookupKey,
        since: DateTime<Utc>,
    ) -> AuthResult<u32> {
        self.check_available()?;
        let count = read(&self.failures)
            .iter()
            .filter(|a| {
                a.role == role
                    && a.lookup_key.canonical() == key.canonical()
                    && a.attempted_at > since
            })
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

impl ActivityLog for InMemoryAuthRepository {
    async fn append(&self, event: &ActivityEvent) -> AuthResult<()> {
        self.check_available()?;
        write(&self.activity).push(event.clone());
        Ok(())
    }
}
