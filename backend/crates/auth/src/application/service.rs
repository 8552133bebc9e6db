//! Auth Service
//!
//! The one object request handlers talk to. Built once at startup and
//! shared through router state; cloning is cheap.

use std::sync::Arc;

use platform::client::ClientContext;
use platform::clock::{Clock, SystemClock};
use platform::password::{ClearTextPassword, HashedPassword, PasswordHasher};

use crate::application::check_session::{CheckSessionUseCase, SessionCheck};
use crate::application::config::AuthConfig;
use crate::application::sign_in::{LoginResult, SignInInput, SignInUseCase};
use crate::application::sign_out::SignOutUseCase;
use crate::application::{anti_forgery, authorize};
use crate::domain::entity::{
    activity::{ActivityAction, ActivityEvent},
    auth_session::AuthSession,
};
use crate::domain::repository::{ActivityLog, AuthRepository, SessionStore};
use crate::domain::value_object::{Capability, Role};
use crate::error::{AuthError, AuthResult};

pub struct AuthService<R>
where
    R: AuthRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
    hasher: Arc<PasswordHasher>,
}

impl<R> Clone for AuthService<R>
where
    R: AuthRepository,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
            hasher: self.hasher.clone(),
        }
    }
}

impl<R> AuthService<R>
where
    R: AuthRepository,
{
    /// Service on the system clock with default Argon2 cost
    pub fn new(repo: R, config: AuthConfig) -> AuthResult<Self> {
        let hasher = PasswordHasher::new(config.password_pepper.clone())?;
        Ok(Self::with_parts(
            Arc::new(repo),
            Arc::new(config),
            Arc::new(SystemClock),
            hasher,
        ))
    }

    pub fn with_parts(
        repo: Arc<R>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            repo,
            config,
            clock,
            hasher: Arc::new(hasher),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    // ------------------------------------------------------------------
    // Login / logout
    // ------------------------------------------------------------------

    pub async fn login(
        &self,
        role: Role,
        lookup_key: impl Into<String>,
        password: impl Into<String>,
        client: &ClientContext,
    ) -> AuthResult<LoginResult> {
        SignInUseCase::new(
            self.repo.clone(),
            self.config.clone(),
            self.clock.clone(),
            self.hasher.clone(),
        )
        .execute(
            SignInInput {
                role,
                lookup_key: lookup_key.into(),
                password: password.into(),
            },
            client,
        )
        .await
    }

    /// Destroy the session named by `session_token`. No-op when there is none.
    pub async fn logout(&self, session_token: Option<&str>, client: &ClientContext) -> AuthResult<()> {
        SignOutUseCase::new(self.repo.clone(), self.config.clone(), self.clock.clone())
            .execute(session_token, client)
            .await
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    pub async fn check_session(&self, session_token: Option<&str>) -> AuthResult<SessionCheck> {
        CheckSessionUseCase::new(self.repo.clone(), self.config.clone(), self.clock.clone())
            .execute(session_token)
            .await
    }

    /// Read-only liveness check; use `check_session` to also record activity
    pub async fn is_session_valid(&self, session_token: Option<&str>) -> AuthResult<bool> {
        CheckSessionUseCase::new(self.repo.clone(), self.config.clone(), self.clock.clone())
            .is_valid(session_token)
            .await
    }

    /// Delete sessions idle past the timeout
    pub async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let idle_before = self.clock.now() - self.config.session_timeout_chrono();
        self.repo.cleanup_expired(idle_before).await
    }

    // ------------------------------------------------------------------
    // Anti-forgery
    // ------------------------------------------------------------------

    pub fn issue_anti_forgery_token<'a>(&self, session: &'a AuthSession) -> &'a str {
        anti_forgery::issue(session)
    }

    pub fn validate_anti_forgery_token(&self, session: &AuthSession, candidate: &str) -> bool {
        anti_forgery::validate(session, candidate)
    }

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------

    pub fn require_capability(
        &self,
        session: Option<&AuthSession>,
        capability: Capability,
    ) -> AuthResult<()> {
        authorize::require_capability(session, capability)
    }

    pub fn require_role(&self, session: Option<&AuthSession>, role: Role) -> AuthResult<()> {
        authorize::require_role(session, role)
    }

    /// Audit a rejected authorization check
    pub async fn record_access_denied(
        &self,
        session: &AuthSession,
        what: &str,
        client: &ClientContext,
    ) {
        tracing::info!(
            role = %session.role,
            identity_id = %session.identity_id,
            denied = what,
            "Access denied"
        );

        let event = ActivityEvent::by(
            session.role,
            session.identity_id,
            ActivityAction::AccessDenied,
            format!("Access denied: {what}"),
            self.clock.now(),
        )
        .with_client(client.ip_string(), client.user_agent.clone());

        if let Err(e) = self.repo.append(&event).await {
            tracing::warn!(error = %e, "Failed to write activity log");
        }
    }

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    /// Hash a new password for a collaborator that creates identities
    pub fn hash_password(&self, password: impl Into<String>) -> AuthResult<HashedPassword> {
        let password = ClearTextPassword::new(password.into())
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        Ok(self.hasher.hash(&password)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::session_token;
    use crate::infra::memory::InMemoryAuthRepository;
    use chrono::Duration;
    use platform::clock::ManualClock;

    pub(crate) struct Fixture {
        pub service: AuthService<InMemoryAuthRepository>,
        pub repo: Arc<InMemoryAuthRepository>,
        pub clock: Arc<ManualClock>,
    }

    pub(crate) fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let clock = Arc::new(ManualClock::default());
        let hasher = PasswordHasher::with_cost(8, 1, 1, None).unwrap();
        let service = AuthService::with_parts(
            repo.clone(),
            Arc::new(AuthConfig::development()),
            clock.clone(),
            hasher,
        );

        let seed = |role, key, pw: &str| {
            let hash = service.hash_password(pw).unwrap();
            repo.insert_identity(role, key, hash, true).unwrap();
        };
        seed(Role::Admin, "alice", "correct-pw");
        seed(Role::Mentor, "bob@x.com", "mentor-pw-1");
        seed(Role::Project, "solar-kiosk", "project-pw-1");

        Fixture {
            service,
            repo,
            clock,
        }
    }

    fn client() -> ClientContext {
        ClientContext {
            ip: Some("192.0.2.10".parse().unwrap()),
            user_agent: Some("test-agent".to_string()),
        }
    }

    async fn login_token(f: &Fixture, role: Role, key: &str, pw: &str) -> String {
        match f.service.login(role, key, pw, &client()).await.unwrap() {
            LoginResult::Success(out) => out.session_token,
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_success_creates_session() {
        let f = fixture();
        let result = f
            .service
            .login(Role::Admin, "alice", "correct-pw", &client())
            .await
            .unwrap();

        let LoginResult::Success(out) = result else {
            panic!("expected success");
        };
        assert_eq!(out.session.role, Role::Admin);
        assert_eq!(out.session.lookup_key.canonical(), "alice");
        assert_eq!(out.session.anti_forgery_token.as_str().len(), 64);
        assert_eq!(out.session.client_ip.as_deref(), Some("192.0.2.10"));
        assert!(f.service.is_session_valid(Some(&out.session_token)).await.unwrap());

        let alice = f.repo.identity(Role::Admin, "alice").unwrap();
        assert_eq!(alice.last_login_at(), Some(f.clock.now()));
        assert!(
            f.repo
                .activity_events()
                .iter()
                .any(|e| e.action == ActivityAction::Login)
        );
    }

    #[tokio::test]
    async fn test_unknown_key_and_wrong_password_look_the_same() {
        let f = fixture();
        let unknown = f
            .service
            .login(Role::Admin, "mallory", "correct-pw", &client())
            .await
            .unwrap();
        let wrong = f
            .service
            .login(Role::Admin, "alice", "wrong", &client())
            .await
            .unwrap();

        assert!(matches!(unknown, LoginResult::InvalidCredentials));
        assert!(matches!(wrong, LoginResult::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_roles_are_separate_namespaces() {
        let f = fixture();
        let result = f
            .service
            .login(Role::Mentor, "alice", "correct-pw", &client())
            .await
            .unwrap();
        assert!(matches!(result, LoginResult::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_inactive_identity_cannot_log_in() {
        let f = fixture();
        let hash = f.service.hash_password("dormant-pw").unwrap();
        f.repo
            .insert_identity(Role::Mentor, "gone@x.com", hash, false)
            .unwrap();

        let result = f
            .service
            .login(Role::Mentor, "gone@x.com", "dormant-pw", &client())
            .await
            .unwrap();
        assert!(matches!(result, LoginResult::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_empty_input_is_validation_error() {
        let f = fixture();
        let err = f
            .service
            .login(Role::Admin, "   ", "correct-pw", &client())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = f
            .service
            .login(Role::Admin, "alice", "", &client())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_lockout_scenario() {
        let f = fixture();

        login_token(&f, Role::Admin, "alice", "correct-pw").await;

        for _ in 0..5 {
            f.clock.advance(Duration::seconds(10));
            let result = f
                .service
                .login(Role::Admin, "alice", "wrong", &client())
                .await
                .unwrap();
            assert!(matches!(result, LoginResult::InvalidCredentials));
        }

        f.clock.advance(Duration::seconds(10));
        let result = f
            .service
            .login(Role::Admin, "alice", "correct-pw", &client())
            .await
            .unwrap();
        assert!(matches!(result, LoginResult::Locked));
        assert!(
            f.repo
                .activity_events()
                .iter()
                .any(|e| e.action == ActivityAction::LoginLocked)
        );

        // Other keys and other roles are unaffected
        login_token(&f, Role::Mentor, "bob@x.com", "mentor-pw-1").await;
    }

    #[tokio::test]
    async fn test_lockout_shared_across_case_variants() {
        let f = fixture();
        for key in ["Alice", "ALICE", "alice", "aLiCe", "alicE"] {
            f.service
                .login(Role::Admin, key, "wrong", &client())
                .await
                .unwrap();
        }
        let result = f
            .service
            .login(Role::Admin, "alice", "correct-pw", &client())
            .await
            .unwrap();
        assert!(matches!(result, LoginResult::Locked));
    }

    #[tokio::test]
    async fn test_lockout_heals_after_window() {
        let f = fixture();
        for _ in 0..5 {
            f.service
                .login(Role::Admin, "alice", "wrong", &client())
                .await
                .unwrap();
        }
        f.clock.advance(Duration::minutes(14));
        assert!(matches!(
            f.service
                .login(Role::Admin, "alice", "correct-pw", &client())
                .await
                .unwrap(),
            LoginResult::Locked
        ));

        f.clock.advance(Duration::minutes(1) + Duration::seconds(1));
        assert!(
            f.service
                .login(Role::Admin, "alice", "correct-pw", &client())
                .await
                .unwrap()
                .is_success()
        );
    }

    #[tokio::test]
    async fn test_success_does_not_clear_failures() {
        let f = fixture();
        for _ in 0..4 {
            f.service
                .login(Role::Admin, "alice", "wrong", &client())
                .await
                .unwrap();
        }
        login_token(&f, Role::Admin, "alice", "correct-pw").await;

        f.service
            .login(Role::Admin, "alice", "wrong", &client())
            .await
            .unwrap();
        assert!(matches!(
            f.service
                .login(Role::Admin, "alice", "correct-pw", &client())
                .await
                .unwrap(),
            LoginResult::Locked
        ));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let f = fixture();
        let token = login_token(&f, Role::Admin, "alice", "correct-pw").await;

        f.service.logout(Some(&token), &client()).await.unwrap();
        assert!(!f.service.is_session_valid(Some(&token)).await.unwrap());

        f.service.logout(Some(&token), &client()).await.unwrap();
        f.service.logout(None, &client()).await.unwrap();
        f.service.logout(Some("garbage"), &client()).await.unwrap();

        let logouts = f
            .repo
            .activity_events()
            .iter()
            .filter(|e| e.action == ActivityAction::Logout)
            .count();
        assert_eq!(logouts, 1);
    }

    #[tokio::test]
    async fn test_session_expiry() {
        let f = fixture();
        let token = login_token(&f, Role::Admin, "alice", "correct-pw").await;

        f.clock.advance(Duration::seconds(3601));

        assert!(matches!(
            f.service.check_session(Some(&token)).await.unwrap(),
            SessionCheck::Expired
        ));
        // Expired sessions are gone, not resurrectable
        let check = f.service.check_session(Some(&token)).await.unwrap();
        assert!(matches!(check, SessionCheck::Missing));
        assert!(check.session().map(|s| s.role).is_none());
        assert_eq!(f.repo.session_count(), 0);
    }

    #[tokio::test]
    async fn test_activity_extends_session() {
        let f = fixture();
        let mut token = login_token(&f, Role::Admin, "alice", "correct-pw").await;

        // Three hours in total, never idle for more than fifty minutes
        for _ in 0..4 {
            f.clock.advance(Duration::minutes(50));
            match f.service.check_session(Some(&token)).await.unwrap() {
                SessionCheck::Active { rotated_token, .. } => {
                    if let Some(rotated) = rotated_token {
                        token = rotated;
                    }
                }
                other => panic!("expected active session, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_session_rotation_keeps_identity() {
        let f = fixture();
        let token = login_token(&f, Role::Mentor, "bob@x.com", "mentor-pw-1").await;
        let SessionCheck::Active { session: before, .. } =
            f.service.check_session(Some(&token)).await.unwrap()
        else {
            panic!("expected active session");
        };

        f.clock.advance(Duration::seconds(1801));

        let SessionCheck::Active {
            session: after,
            rotated_token: Some(new_token),
        } = f.service.check_session(Some(&token)).await.unwrap()
        else {
            panic!("expected rotated session");
        };

        assert_ne!(after.session_id, before.session_id);
        assert_eq!(after.identity_id, before.identity_id);
        assert_eq!(after.role, Role::Mentor);
        assert_eq!(after.anti_forgery_token, before.anti_forgery_token);
        assert!(f.service.is_session_valid(Some(&new_token)).await.unwrap());

        // The old identifier is only honoured for the grace period
        assert!(f.service.is_session_valid(Some(&token)).await.unwrap());
        f.clock.advance(Duration::seconds(31));
        assert!(!f.service.is_session_valid(Some(&token)).await.unwrap());
        assert!(matches!(
            f.service.check_session(Some(&token)).await.unwrap(),
            SessionCheck::Missing
        ));
        assert!(f.service.is_session_valid(Some(&new_token)).await.unwrap());
    }

    #[tokio::test]
    async fn test_validity_check_does_not_rotate() {
        let f = fixture();
        let token = login_token(&f, Role::Admin, "alice", "correct-pw").await;
        f.clock.advance(Duration::seconds(1801));

        assert!(f.service.is_session_valid(Some(&token)).await.unwrap());
        f.clock.advance(Duration::seconds(60));
        assert!(f.service.is_session_valid(Some(&token)).await.unwrap());

        // Rotation only happens on a full check, which hands back the new cookie
        let SessionCheck::Active {
            rotated_token: Some(new_token),
            ..
        } = f.service.check_session(Some(&token)).await.unwrap()
        else {
            panic!("expected rotated session");
        };
        assert!(f.service.is_session_valid(Some(&new_token)).await.unwrap());
        assert_eq!(f.repo.session_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_checks_across_rotation() {
        let f = fixture();
        let token = login_token(&f, Role::Admin, "alice", "correct-pw").await;
        f.clock.advance(Duration::seconds(1801));

        let (first, second) = tokio::join!(
            f.service.check_session(Some(&token)),
            f.service.check_session(Some(&token)),
        );

        let tokens: Vec<String> = [first.unwrap(), second.unwrap()]
            .into_iter()
            .map(|check| match check {
                SessionCheck::Active {
                    rotated_token: Some(t),
                    ..
                } => t,
                other => panic!("expected rotated active session, got {other:?}"),
            })
            .collect();

        // Both tabs are pointed at the one surviving session
        assert_eq!(tokens[0], tokens[1]);
        assert_eq!(f.repo.session_count(), 1);
        assert!(f.service.is_session_valid(Some(&tokens[0])).await.unwrap());
    }

    #[tokio::test]
    async fn test_lost_rotation_race_adopts_winner() {
        let f = fixture();
        let token = login_token(&f, Role::Admin, "alice", "correct-pw").await;
        f.clock.advance(Duration::seconds(1801));

        // Another request rotates between this request's read and its write
        let session_id =
            session_token::verify(&f.service.config().session_secret, &token).unwrap();
        let mut winner = f.repo.find_by_id(session_id).await.unwrap().unwrap();
        let old = winner.rotate(f.clock.now());
        assert!(f.repo.rotate(old, &winner).await.unwrap());

        let mut loser = winner.clone();
        loser.session_id = old;
        loser.rotate(f.clock.now());
        assert!(!f.repo.rotate(old, &loser).await.unwrap());

        let SessionCheck::Active {
            session,
            rotated_token: Some(new_token),
        } = f.service.check_session(Some(&token)).await.unwrap()
        else {
            panic!("expected active session");
        };
        assert_eq!(session.session_id, winner.session_id);
        assert_eq!(
            session_token::verify(&f.service.config().session_secret, &new_token),
            Some(winner.session_id)
        );
    }

    #[tokio::test]
    async fn test_anti_forgery_round_trip() {
        let f = fixture();
        let token = login_token(&f, Role::Project, "solar-kiosk", "project-pw-1").await;
        let session = f
            .service
            .check_session(Some(&token))
            .await
            .unwrap()
            .into_session()
            .unwrap();

        let csrf = f.service.issue_anti_forgery_token(&session).to_string();
        assert!(f.service.validate_anti_forgery_token(&session, &csrf));

        let mut mutated = csrf.clone();
        let first = mutated.remove(0);
        mutated.insert(0, if first == 'f' { 'e' } else { 'f' });
        assert!(!f.service.validate_anti_forgery_token(&session, &mutated));
    }

    #[tokio::test]
    async fn test_token_from_older_session_rejected() {
        let f = fixture();
        let old_token = login_token(&f, Role::Admin, "alice", "correct-pw").await;
        let old = f
            .service
            .check_session(Some(&old_token))
            .await
            .unwrap()
            .into_session()
            .unwrap();
        f.service.logout(Some(&old_token), &client()).await.unwrap();

        let new_token = login_token(&f, Role::Admin, "alice", "correct-pw").await;
        let current = f
            .service
            .check_session(Some(&new_token))
            .await
            .unwrap()
            .into_session()
            .unwrap();

        let stale = f.service.issue_anti_forgery_token(&old);
        assert!(!f.service.validate_anti_forgery_token(&current, stale));
        assert!(matches!(
            anti_forgery::require(&current, Some(stale)),
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_mentor_forbidden_from_approving() {
        let f = fixture();
        let token = login_token(&f, Role::Mentor, "bob@x.com", "mentor-pw-1").await;
        let check = f.service.check_session(Some(&token)).await.unwrap();

        assert!(matches!(
            f.service
                .require_capability(check.session(), Capability::ApproveApplications),
            Err(AuthError::Forbidden)
        ));
        assert!(matches!(
            f.service.require_capability(None, Capability::ApproveApplications),
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_logout_with_pre_rotation_cookie() {
        let f = fixture();
        let token = login_token(&f, Role::Admin, "alice", "correct-pw").await;
        f.clock.advance(Duration::seconds(1801));
        let SessionCheck::Active {
            rotated_token: Some(new_token),
            ..
        } = f.service.check_session(Some(&token)).await.unwrap()
        else {
            panic!("expected rotated session");
        };

        f.service.logout(Some(&token), &client()).await.unwrap();
        assert_eq!(f.repo.session_count(), 0);
        assert!(!f.service.is_session_valid(Some(&new_token)).await.unwrap());
    }

    #[tokio::test]
    async fn test_legacy_bcrypt_login_upgrades_hash() {
        let f = fixture();
        let legacy = HashedPassword::from_stored(bcrypt::hash("legacy-pass-1", 4).unwrap());
        f.repo
            .insert_identity(Role::Mentor, "carol@x.com", legacy, true)
            .unwrap();

        login_token(&f, Role::Mentor, "carol@x.com", "legacy-pass-1").await;

        let upgraded = f.repo.identity(Role::Mentor, "carol@x.com").unwrap();
        assert!(!upgraded.password_hash().is_legacy_bcrypt());
        assert!(!upgraded.password_hash().needs_rehash());

        // The new hash keeps accepting the same password
        login_token(&f, Role::Mentor, "carol@x.com", "legacy-pass-1").await;
        assert!(matches!(
            f.service
                .login(Role::Mentor, "carol@x.com", "wrong-pass-1", &client())
                .await
                .unwrap(),
            LoginResult::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let f = fixture();
        f.repo.set_unavailable(true);

        let err = f
            .service
            .login(Role::Admin, "alice", "correct-pw", &client())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_validity_check_reports_storage_failure() {
        let f = fixture();
        let token = login_token(&f, Role::Admin, "alice", "correct-pw").await;
        assert!(!f.service.is_session_valid(Some("x.y")).await.unwrap());

        f.repo.set_unavailable(true);
        assert!(matches!(
            f.service.is_session_valid(Some(&token)).await,
            Err(AuthError::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let f = fixture();
        login_token(&f, Role::Admin, "alice", "correct-pw").await;
        f.clock.advance(Duration::hours(2));
        login_token(&f, Role::Mentor, "bob@x.com", "mentor-pw-1").await;

        assert_eq!(f.service.cleanup_expired_sessions().await.unwrap(), 1);
        assert_eq!(f.repo.session_count(), 1);
    }

    #[test]
    fn test_hash_password_enforces_minimum() {
        let f = fixture();
        assert!(matches!(
            f.service.hash_password("short"),
            Err(AuthError::Validation(_))
        ));
    }
}
