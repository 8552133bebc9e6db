//! Domain Layer
//!
//! Contains entities, value objects, the authorization policy and
//! repository traits.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    activity::{ActivityAction, ActivityEvent},
    auth_session::AuthSession,
    failed_attempt::FailedAttempt,
    identity::Identity,
};
pub use repository::{ActivityLog, AttemptLedger, AuthRepository, CredentialStore, SessionStore};
