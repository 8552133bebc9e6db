//! Activity Event
//!
//! Audit rows written to the activity log shared with the rest of the
//! tracker.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::value_object::{IdentityId, LookupKey, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    Login,
    Logout,
    FailedLogin,
    LoginLocked,
    SessionExpired,
    AccessDenied,
}

impl ActivityAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Login => "login",
            ActivityAction::Logout => "logout",
            ActivityAction::FailedLogin => "failed_login",
            ActivityAction::LoginLocked => "login_locked",
            ActivityAction::SessionExpired => "session_expired",
            ActivityAction::AccessDenied => "access_denied",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ActivityEvent {
    /// `None` when nobody is logged in (failed or locked logins)
    pub actor_role: Option<Role>,
    pub actor_id: Option<IdentityId>,
    pub action: ActivityAction,
    pub description: String,
    /// Role and canonical key the event is about, when there is one
    pub subject: Option<(Role, String)>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityEvent {
    /// Event attributed to a logged-in identity
    pub fn by(
        role: Role,
        id: IdentityId,
        action: ActivityAction,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            actor_role: Some(role),
            actor_id: Some(id),
            action,
            description: description.into(),
            subject: None,
            client_ip: None,
            user_agent: None,
            created_at: now,
        }
    }

    /// Event about a login key with no authenticated actor
    pub fn anonymous(
        role: Role,
        key: &LookupKey,
        action: ActivityAction,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            actor_role: None,
            actor_id: None,
            action,
            description: description.into(),
            subject: Some((role, key.canonical().to_string())),
            client_ip: None,
            user_agent: None,
            created_at: now,
        }
    }

    pub fn with_subject(mut self, role: Role, key: &LookupKey) -> Self {
        self.subject = Some((role, key.canonical().to_string()));
        self
    }

    pub fn with_client(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.client_ip = ip;
        self.user_agent = user_agent;
        self
    }
}
