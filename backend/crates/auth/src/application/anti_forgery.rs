//! Anti-forgery token checks
//!
//! The token lives on the session; these helpers only read it.

use crate::domain::entity::auth_session::AuthSession;
use crate::error::{AuthError, AuthResult};

/// The token a form or client must echo back
pub fn issue(session: &AuthSession) -> &str {
    session.anti_forgery_token.as_str()
}

/// Constant-time check of a submitted token
pub fn validate(session: &AuthSession, candidate: &str) -> bool {
    session.anti_forgery_token.matches(candidate)
}

/// Guard for state-changing requests
pub fn require(session: &AuthSession, candidate: Option<&str>) -> AuthResult<()> {
    match candidate {
        Some(candidate) if validate(session, candidate) => Ok(()),
        _ => {
            tracing::info!(
                role = %session.role,
                identity_id = %session.identity_id,
                present = candidate.is_some(),
                "Anti-forgery token rejected"
            );
            Err(AuthError::InvalidToken)
        }
    }
}
