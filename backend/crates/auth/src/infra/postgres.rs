//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use platform::password::HashedPassword;

use crate::domain::entity::{
    activity::{ActivityAction, ActivityEvent},
    auth_session::AuthSession,
    failed_attempt::FailedAttempt,
    identity::Identity,
};
use crate::domain::repository::{ActivityLog, AttemptLedger, CredentialStore, SessionStore};
use crate::domain::value_object::{AntiForgeryToken, IdentityId, LookupKey, Role, SessionId};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Credential Store Implementation
// ============================================================================

impl CredentialStore for PgAuthRepository {
    async fn find_identity(&self, role: Role, key: &LookupKey) -> AuthResult<Option<Identity>> {
        // Table and column names come from the closed Role enum
        let sql = format!(
            r#"
            SELECT
                {id} AS id,
                {lookup} AS lookup_key,
                password_hash,
                is_active,
                last_login
            FROM {table}
            WHERE lower({lookup}) = $1 AND is_active = TRUE
            LIMIT 1
            "#,
            id = role.id_column(),
            lookup = role.lookup_column(),
            table = role.table(),
        );

        let row = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(key.canonical())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_identity(role)))
    }

    async fn replace_password_hash(
        &self,
        role: Role,
        id: IdentityId,
        hash: &HashedPassword,
    ) -> AuthResult<()> {
        let sql = format!(
            "UPDATE {table} SET password_hash = $2 WHERE {id} = $1",
            table = role.table(),
            id = role.id_column(),
        );

        sqlx::query(&sql)
            .bind(id.get())
            .bind(hash.as_phc_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn touch_last_login(
        &self,
        role: Role,
        id: IdentityId,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let sql = format!(
            "UPDATE {table} SET last_login = $2 WHERE {id} = $1",
            table = role.table(),
            id = role.id_column(),
        );

        sqlx::query(&sql)
            .bind(id.get())
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Session Store Implementation
// ============================================================================

impl SessionStore for PgAuthRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_type,
                user_id,
                user_identifier,
                anti_forgery_token,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.role.code())
        .bind(session.identity_id.get())
        .bind(session.lookup_key.original())
        .bind(session.anti_forgery_token.as_str())
        .bind(&session.client_ip)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, session_id: SessionId) -> AuthResult<Option<AuthSession>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                previous_session_id,
                user_type,
                user_id,
                user_identifier,
                anti_forgery_token,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            FROM auth_sessions
            WHERE session_id = $1 OR previous_session_id = $1
            ORDER BY (session_id = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_session()).transpose()
    }

    async fn update(&self, session: &AuthSession) -> AuthResult<()> {
        // Concurrent requests may race; keep the latest activity
        sqlx::query(
            r#"
            UPDATE auth_sessions
            SET last_activity_at = GREATEST(last_activity_at, $2)
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn rotate(&self, old_id: SessionId, session: &AuthSession) -> AuthResult<bool> {
        // The row lock serializes racing rotations; the loser matches no row
        let rotated = sqlx::query(
            r#"
            UPDATE auth_sessions
            SET session_id = $2,
                previous_session_id = session_id,
                created_at = $3,
                last_activity_at = GREATEST(last_activity_at, $4)
            WHERE session_id = $1
            "#,
        )
        .bind(old_id.as_uuid())
        .bind(session.session_id.as_uuid())
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rotated == 1)
    }

    async fn delete(&self, session_id: SessionId) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired(&self, idle_before: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE last_activity_at < $1")
            .bind(idle_before)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Attempt Ledger Implementation
// ============================================================================
//
// Failed logins are `failed_login` rows in the shared activity log, with the
// role and canonical key in their own columns.

impl AttemptLedger for PgAuthRepository {
    async fn record_failure(&self, attempt: &FailedAttempt) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (
                user_type,
                user_id,
                action,
                description,
                subject_role,
                subject_key,
                ip_address,
                user_agent,
                created_at
            ) VALUES (NULL, NULL, $1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(ActivityAction::FailedLogin.as_str())
        .bind(format!(
            "Failed login attempt for {}: {}",
            attempt.role,
            attempt.lookup_key.original()
        ))
        .bind(attempt.role.code())
        .bind(attempt.lookup_key.canonical())
        .bind(&attempt.client_ip)
        .bind(&attempt.user_agent)
        .bind(attempt.attempted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_recent_failures(
        &self,
        role: Role,
        key: &LookupKey,
        since: DateTime<Utc>,
    ) -> AuthResult<u32> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM activity_logs
            WHERE action = $1
              AND subject_role = $2
              AND subject_key = $3
              AND created_at > $4
            "#,
        )
        .bind(ActivityAction::FailedLogin.as_str())
        .bind(role.code())
        .bind(key.canonical())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

// ============================================================================
// Activity Log Implementation
// ============================================================================

impl ActivityLog for PgAuthRepository {
    async fn append(&self, event: &ActivityEvent) -> AuthResult<()> {
        let (subject_role, subject_key) = match &event.subject {
            Some((role, key)) => (Some(role.code()), Some(key.as_str())),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO activity_logs (
                user_type,
                user_id,
                action,
                description,
                subject_role,
                subject_key,
                ip_address,
                user_agent,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.actor_role.map(|r| r.code()))
        .bind(event.actor_id.map(|id| id.get()))
        .bind(event.action.as_str())
        .bind(&event.description)
        .bind(subject_role)
        .bind(subject_key)
        .bind(&event.client_ip)
        .bind(&event.user_agent)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: i64,
    lookup_key: String,
    password_hash: String,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
}

impl IdentityRow {
    fn into_identity(self, role: Role) -> Identity {
        Identity::from_parts(
            role,
            IdentityId::new(self.id),
            LookupKey::from_db(&self.lookup_key),
            HashedPassword::from_stored(self.password_hash),
            self.is_active,
            self.last_login,
        )
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    previous_session_id: Option<Uuid>,
    user_type: String,
    user_id: i64,
    user_identifier: String,
    anti_forgery_token: String,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthResult<AuthSession> {
        let role = self
            .user_type
            .parse::<Role>()
            .map_err(|e| AuthError::Internal(format!("Invalid session row: {e}")))?;

        Ok(AuthSession {
            session_id: SessionId::from_uuid(self.session_id),
            previous_session_id: self.previous_session_id.map(SessionId::from_uuid),
            role,
            identity_id: IdentityId::new(self.user_id),
            lookup_key: LookupKey::from_db(&self.user_identifier),
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
            anti_forgery_token: AntiForgeryToken::from_db(self.anti_forgery_token),
            client_ip: self.client_ip,
            user_agent: self.user_agent,
        })
    }
}
