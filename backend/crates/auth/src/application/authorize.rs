//! Request-entry guards
//!
//! Pure checks over an optional session; callers run them before any
//! domain logic.

use crate::domain::entity::auth_session::AuthSession;
use crate::domain::policy;
use crate::domain::value_object::{Capability, Role};
use crate::error::{AuthError, AuthResult};

pub fn require_capability(session: Option<&AuthSession>, capability: Capability) -> AuthResult<()> {
    let session = session.ok_or(AuthError::Unauthenticated)?;

    if policy::has(session.role, capability) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

pub fn require_role(session: Option<&AuthSession>, role: Role) -> AuthResult<()> {
    let session = session.ok_or(AuthError::Unauthenticated)?;

    if session.role == role {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
