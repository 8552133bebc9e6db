//! Sign Out Use Case
//!
//! Invalidates a user session. Safe to call repeatedly.

use std::sync::Arc;

use platform::client::ClientContext;
use platform::clock::Clock;

use crate::application::config::AuthConfig;
use crate::application::session_token;
use crate::domain::entity::activity::{ActivityAction, ActivityEvent};
use crate::domain::repository::{ActivityLog, AuthRepository, SessionStore};
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<R>
where
    R: AuthRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<R> SignOutUseCase<R>
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

    /// Delete the session named by the cookie, if any
    pub async fn execute(
        &self,
        session_token: Option<&str>,
        client: &ClientContext,
    ) -> AuthResult<()> {
        let Some(session_id) =
            session_token.and_then(|t| session_token::verify(&self.config.session_secret, t))
        else {
            return Ok(());
        };

        // A cookie from just before a rotation names the session by its old id
        let session = self.repo.find_by_id(session_id).await?;
        let current_id = session.as_ref().map_or(session_id, |s| s.session_id);
        self.repo.delete(current_id).await?;

        if let Some(session) = session {
            tracing::info!(
                role = %session.role,
                identity_id = %session.identity_id,
                session_id = %current_id,
                "Signed out"
            );

            let event = ActivityEvent::by(
                session.role,
                session.identity_id,
                ActivityAction::Logout,
                format!("{} logged out", session.role),
                self.clock.now(),
            )
            .with_client(client.ip_string(), client.user_agent.clone());

            if let Err(e) = self.repo.append(&event).await {
                tracing::warn!(error = %e, "Failed to write activity log");
            }
        }

        Ok(())
    }
}
