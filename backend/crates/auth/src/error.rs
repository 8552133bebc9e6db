//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
///
/// Display strings are what the client sees; none of them reveal whether
/// a lookup key exists.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown key or wrong password
    #[error("Invalid username or password.")]
    InvalidCredentials,

    /// Too many recent failures for this key
    #[error("Account temporarily locked due to too many failed attempts.")]
    AccountLocked,

    /// Session idled past the timeout
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    /// No session at all
    #[error("Please log in to continue.")]
    Unauthenticated,

    /// Missing or mismatched anti-forgery token
    #[error("Invalid security token. Please try again.")]
    InvalidToken,

    /// Session is valid but lacks the role or capability
    #[error("Access denied. You don't have permission to view this page.")]
    Forbidden,

    /// Malformed request input
    #[error("{0}")]
    Validation(String),

    /// Storage collaborator failed
    #[error("Service temporarily unavailable.")]
    StorageUnavailable(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::SessionExpired
            | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::AccountLocked => StatusCode::LOCKED,
            AuthError::InvalidToken | AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::SessionExpired
            | AuthError::Unauthenticated => ErrorKind::Unauthorized,
            AuthError::AccountLocked => ErrorKind::Locked,
            AuthError::InvalidToken | AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::StorageUnavailable(_) => ErrorKind::ServiceUnavailable,
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Whether the caller has to log in (again) to recover
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            AuthError::SessionExpired | AuthError::Unauthenticated
        )
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = match self {
            // Internal detail stays in the logs
            AuthError::Internal(_) => AppError::internal("An unexpected error occurred."),
            _ => AppError::new(self.kind(), self.to_string()),
        };

        match self {
            AuthError::SessionExpired | AuthError::Unauthenticated => {
                err.with_action("Log in again.")
            }
            AuthError::InvalidToken => err.with_action("Reload the page to get a fresh token."),
            AuthError::StorageUnavailable(_) => err.with_action("Retry later."),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::StorageUnavailable(e) => {
                tracing::error!(error = %e, "Auth storage unavailable");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            _ => {
                tracing::debug!(error = %self, "Auth request rejected");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let mut response = self.to_app_error().into_response();
        if self.requires_login() {
            response
                .headers_mut()
                .insert("x-auth-required", http::HeaderValue::from_static("true"));
        }
        response
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        use platform::password::PasswordHashError;
        match err {
            PasswordHashError::Policy(policy) => AuthError::Validation(policy.to_string()),
            other => AuthError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::AccountLocked.status_code(), StatusCode::LOCKED);
        assert_eq!(AuthError::SessionExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::StorageUnavailable(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_kind_matches_status() {
        let all = [
            AuthError::InvalidCredentials,
            AuthError::AccountLocked,
            AuthError::SessionExpired,
            AuthError::Unauthenticated,
            AuthError::InvalidToken,
            AuthError::Forbidden,
            AuthError::Validation("bad".into()),
            AuthError::StorageUnavailable(sqlx::Error::PoolClosed),
            AuthError::Internal("boom".into()),
        ];
        for err in all {
            assert_eq!(err.kind().status_code(), err.status_code().as_u16(), "{err:?}");
        }
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let app = AuthError::Internal("db password is hunter2".into()).to_app_error();
        assert!(!app.message().contains("hunter2"));
    }

    #[test]
    fn test_unauthenticated_response_has_header() {
        let response = AuthError::SessionExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["x-auth-required"], "true");

        let response = AuthError::Forbidden.into_response();
        assert!(response.headers().get("x-auth-required").is_none());
    }
}
