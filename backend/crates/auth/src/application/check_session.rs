//! Check Session Use Case
//!
//! Resolves a cookie value to a live session, refreshing activity and
//! rotating the id when it is due. Never hashes passwords.
//!
//! Two requests of one client may race (two tabs). A request carrying the
//! id that another request just rotated away still resolves for
//! `rotation_grace` and gets the new cookie; a request that loses a
//! rotation race adopts the winner's id.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::clock::Clock;

use crate::application::config::AuthConfig;
use crate::application::session_token;
use crate::domain::entity::{
    activity::{ActivityAction, ActivityEvent},
    auth_session::AuthSession,
};
use crate::domain::repository::{ActivityLog, AuthRepository, SessionStore};
use crate::domain::value_object::SessionId;
use crate::error::AuthResult;

/// Result of resolving a session cookie
#[derive(Debug, Clone)]
pub enum SessionCheck {
    /// Session is live. `rotated_token` is set when the id changed and the
    /// cookie must be re-issued.
    Active {
        session: AuthSession,
        rotated_token: Option<String>,
    },
    /// Session existed but idled out; it has been deleted
    Expired,
    /// No cookie, bad signature, unknown id, or a pre-rotation id past its
    /// grace period
    Missing,
}

impl SessionCheck {
    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            SessionCheck::Active { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn into_session(self) -> Option<AuthSession> {
        match self {
            SessionCheck::Active { session, .. } => Some(session),
            _ => None,
        }
    }
}

/// Check session use case
pub struct CheckSessionUseCase<R>
where
    R: AuthRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<R> CheckSessionUseCase<R>
where
    R: AuthRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self, session_token: Option<&str>) -> AuthResult<SessionCheck> {
        let Some(presented) =
            session_token.and_then(|t| session_token::verify(&self.config.session_secret, t))
        else {
            return Ok(SessionCheck::Missing);
        };

        let now = self.clock.now();
        let Some(mut session) = self.lookup(presented, now).await? else {
            return Ok(SessionCheck::Missing);
        };

        if session.is_expired(now, self.config.session_timeout_chrono()) {
            self.repo.delete(session.session_id).await?;

            tracing::info!(
                role = %session.role,
                identity_id = %session.identity_id,
                session_id = %session.session_id,
                "Session expired"
            );

            let event = ActivityEvent::by(
                session.role,
                session.identity_id,
                ActivityAction::SessionExpired,
                "Session expired after inactivity",
                now,
            );
            if let Err(e) = self.repo.append(&event).await {
                tracing::warn!(error = %e, "Failed to write activity log");
            }

            return Ok(SessionCheck::Expired);
        }

        session.touch(now);

        let rotated_token = if session.session_id != presented {
            // Cookie still names the pre-rotation id
            self.repo.update(&session).await?;
            Some(self.sign(&session)?)
        } else if session.needs_rotation(now, self.config.rotation_interval_chrono()) {
            let old_id = session.rotate(now);

            if self.repo.rotate(old_id, &session).await? {
                tracing::debug!(
                    old_session_id = %old_id,
                    session_id = %session.session_id,
                    "Session id rotated"
                );
            } else {
                // A concurrent request rotated first; follow its id
                let Some(current) = self.lookup(old_id, now).await? else {
                    return Ok(SessionCheck::Missing);
                };
                session = current;
                session.touch(now);
                self.repo.update(&session).await?;
            }

            Some(self.sign(&session)?)
        } else {
            self.repo.update(&session).await?;
            None
        };

        Ok(SessionCheck::Active {
            session,
            rotated_token,
        })
    }

    /// Whether the cookie names a live session.
    ///
    /// Read-only: never touches, rotates or deletes, so the caller's cookie
    /// stays valid.
    pub async fn is_valid(&self, session_token: Option<&str>) -> AuthResult<bool> {
        let Some(presented) =
            session_token.and_then(|t| session_token::verify(&self.config.session_secret, t))
        else {
            return Ok(false);
        };

        let now = self.clock.now();
        Ok(self
            .lookup(presented, now)
            .await?
            .is_some_and(|s| !s.is_expired(now, self.config.session_timeout_chrono())))
    }

    /// Session named by `presented`, either as its current id or as its
    /// pre-rotation id inside the grace period
    async fn lookup(
        &self,
        presented: SessionId,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<AuthSession>> {
        let Some(session) = self.repo.find_by_id(presented).await? else {
            return Ok(None);
        };

        if session.session_id == presented
            || session.accepts_previous(presented, now, self.config.rotation_grace_chrono())
        {
            Ok(Some(session))
        } else {
            Ok(None)
        }
    }

    fn sign(&self, session: &AuthSession) -> AuthResult<String> {
        session_token::sign(&self.config.session_secret, session.session_id)
    }
}
