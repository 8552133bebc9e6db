//! Sign In Use Case
//!
//! Lockout check, credential lookup, password verification, session
//! creation. Unknown key and wrong password take the same path (including
//! one Argon2 verification) and produce the same result.

use std::sync::Arc;

use platform::client::ClientContext;
use platform::clock::Clock;
use platform::password::{ClearTextPassword, PasswordHasher};

use crate::application::config::AuthConfig;
use crate::application::session_token;
use crate::domain::entity::{
    activity::{ActivityAction, ActivityEvent},
    auth_session::AuthSession,
    failed_attempt::FailedAttempt,
    identity::Identity,
};
use crate::domain::repository::{
    ActivityLog, AttemptLedger, AuthRepository, CredentialStore, SessionStore,
};
use crate::domain::value_object::{LookupKey, Role};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub role: Role,
    /// Username, email or profile name depending on role
    pub lookup_key: String,
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone)]
pub struct SignInOutput {
    pub session: AuthSession,
    /// Signed value for the session cookie
    pub session_token: String,
}

/// Outcome of a login attempt. Storage failures are `Err`, not a variant.
#[derive(Debug, Clone)]
pub enum LoginResult {
    Success(SignInOutput),
    InvalidCredentials,
    Locked,
}

impl LoginResult {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginResult::Success(_))
    }

    /// `Success` as a value, the rest as the matching error
    pub fn into_result(self) -> AuthResult<SignInOutput> {
        match self {
            LoginResult::Success(out) => Ok(out),
            LoginResult::InvalidCredentials => Err(AuthError::InvalidCredentials),
            LoginResult::Locked => Err(AuthError::AccountLocked),
        }
    }
}

/// Sign in use case
pub struct SignInUseCase<R>
where
    R: AuthRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
    hasher: Arc<PasswordHasher>,
}

impl<R> SignInUseCase<R>
where
    R: AuthRepository,
{
    pub fn new(
        repo: Arc<R>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
        hasher: Arc<PasswordHasher>,
    ) -> Self {
        Self {
            repo,
            config,
            clock,
            hasher,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        client: &ClientContext,
    ) -> AuthResult<LoginResult> {
        let role = input.role;
        let key = LookupKey::new(&input.lookup_key)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        let password = ClearTextPassword::new(input.password)
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let now = self.clock.now();
        let policy = self.config.lockout_policy();

        // Lockout is decided before any credential lookup or hashing
        let recent = self
            .repo
            .count_recent_failures(role, &key, policy.window_start(now))
            .await?;

        if policy.is_locked(recent) {
            tracing::info!(
                role = %role,
                lookup_key = %key.canonical(),
                recent_failures = recent,
                "Login refused: key locked"
            );
            self.audit(
                ActivityEvent::anonymous(
                    role,
                    &key,
                    ActivityAction::LoginLocked,
                    format!("Locked login attempt for {role} {}", key.canonical()),
                    now,
                )
                .with_client(client.ip_string(), client.user_agent.clone()),
            )
            .await;
            return Ok(LoginResult::Locked);
        }

        let identity = self.repo.find_identity(role, &key).await?;

        let verified = match &identity {
            Some(identity) if identity.is_active() => {
                self.hasher.verify(&password, identity.password_hash())
            }
            _ => {
                self.hasher.verify_dummy(&password);
                false
            }
        };

        let identity = match identity {
            Some(identity) if verified => identity,
            _ => {
                self.repo
                    .record_failure(&FailedAttempt {
                        role,
                        lookup_key: key.clone(),
                        attempted_at: now,
                        client_ip: client.ip_string(),
                        user_agent: client.user_agent.clone(),
                    })
                    .await?;

                tracing::info!(
                    role = %role,
                    lookup_key = %key.canonical(),
                    recent_failures = recent + 1,
                    "Login failed: invalid credentials"
                );
                return Ok(LoginResult::InvalidCredentials);
            }
        };

        let session = AuthSession::new(
            role,
            identity.id(),
            identity.lookup_key().clone(),
            client.ip_string(),
            client.user_agent.clone(),
            now,
        );

        self.repo.create(&session).await?;
        let session_token = session_token::sign(&self.config.session_secret, session.session_id)?;

        if identity.password_hash().needs_rehash() {
            self.upgrade_hash(&identity, &password).await;
        }

        // Bookkeeping only; the login already succeeded
        if let Err(e) = self.repo.touch_last_login(role, identity.id(), now).await {
            tracing::warn!(
                error = %e,
                role = %role,
                identity_id = %identity.id(),
                "Failed to record last login"
            );
        }

        self.audit(
            ActivityEvent::by(
                role,
                identity.id(),
                ActivityAction::Login,
                format!("{role} logged in"),
                now,
            )
            .with_subject(role, &key)
            .with_client(client.ip_string(), client.user_agent.clone()),
        )
        .await;

        tracing::info!(
            role = %role,
            identity_id = %identity.id(),
            session_id = %session.session_id,
            "Signed in"
        );

        Ok(LoginResult::Success(SignInOutput {
            session,
            session_token,
        }))
    }

    /// Re-hash a verified legacy password with Argon2id. Best effort.
    async fn upgrade_hash(&self, identity: &Identity, password: &ClearTextPassword) {
        let hash = match self.hasher.hash(password) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    role = %identity.role(),
                    identity_id = %identity.id(),
                    "Legacy password hash kept"
                );
                return;
            }
        };

        match self
            .repo
            .replace_password_hash(identity.role(), identity.id(), &hash)
            .await
        {
            Ok(()) => tracing::info!(
                role = %identity.role(),
                identity_id = %identity.id(),
                "Upgraded legacy password hash"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                role = %identity.role(),
                identity_id = %identity.id(),
                "Failed to store upgraded password hash"
            ),
        }
    }

    async fn audit(&self, event: ActivityEvent) {
        if let Err(e) = self.repo.append(&event).await {
            tracing::warn!(error = %e, action = %event.action, "Failed to write activity log");
        }
    }
}
