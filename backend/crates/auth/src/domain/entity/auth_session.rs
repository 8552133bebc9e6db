//! Auth Session Entity
//!
//! The server-side record behind a session cookie.
//!
//! Two clocks run on every session:
//! - idle timeout, measured from `last_activity_at`; past it the session
//!   is dead and must be deleted
//! - rotation interval, measured from `created_at`; past it the session
//!   gets a fresh id (and `created_at` restarts) while the identity and
//!   anti-forgery token carry over
//!
//! The id replaced by the latest rotation is remembered in
//! `previous_session_id`, so a request that was already in flight with the
//! old cookie can still be matched during a short grace period.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{AntiForgeryToken, IdentityId, LookupKey, Role, SessionId};

/// Auth session entity
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Transport-level identifier (cookie references it)
    pub session_id: SessionId,
    /// Identifier before the most recent rotation
    pub previous_session_id: Option<SessionId>,
    pub role: Role,
    pub identity_id: IdentityId,
    pub lookup_key: LookupKey,
    /// Set at login and reset on every rotation
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub anti_forgery_token: AntiForgeryToken,
    /// Client IP at login (for audit)
    pub client_ip: Option<String>,
    /// User agent at login (for audit)
    pub user_agent: Option<String>,
}

impl AuthSession {
    /// Fresh session for a successful login
    pub fn new(
        role: Role,
        identity_id: IdentityId,
        lookup_key: LookupKey,
        client_ip: Option<String>,
        user_agent: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: SessionId::new(),
            previous_session_id: None,
            role,
            identity_id,
            lookup_key,
            created_at: now,
            last_activity_at: now,
            anti_forgery_token: AntiForgeryToken::generate(),
            client_ip,
            user_agent,
        }
    }

    /// Idle for strictly longer than `timeout`
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_activity_at > timeout
    }

    /// Older than `interval` since creation or last rotation
    pub fn needs_rotation(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        now - self.created_at > interval
    }

    /// Record activity
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity_at {
            self.last_activity_at = now;
        }
    }

    /// New identifier, restarted rotation clock. Returns the old id.
    pub fn rotate(&mut self, now: DateTime<Utc>) -> SessionId {
        let old = self.session_id;
        self.previous_session_id = Some(old);
        self.session_id = SessionId::new();
        self.created_at = now;
        old
    }

    /// Whether `presented` is the pre-rotation id and still within `grace`
    /// of the rotation
    pub fn accepts_previous(
        &self,
        presented: SessionId,
        now: DateTime<Utc>,
        grace: Duration,
    ) -> bool {
        self.previous_session_id == Some(presented) && now - self.created_at <= grace
    }
}
