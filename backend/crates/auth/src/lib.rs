//! Auth (Authentication & Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Identities, sessions, the capability policy, repository traits
//! - `application/` - Use cases and the `AuthService` facade
//! - `infra/` - Postgres and in-memory repository implementations
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Password login for three separate identity namespaces (admin, mentor, project)
//! - Server-side sessions with HMAC-signed cookie tokens
//! - Idle timeout and periodic session ID rotation
//! - Per-session anti-forgery tokens
//! - Static role-to-capability authorization table
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional pepper
//! - Lockout after repeated failures per (role, lookup key) within a sliding window
//! - Login failures never reveal whether a lookup key exists
//! - Every login, logout, failure and denial lands in the activity log

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::{AuthConfig, AuthService, LoginResult, SessionCheck};
pub use domain::value_object::{Capability, Role};
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryAuthRepository, PgAuthRepository};
pub use presentation::{CurrentSession, auth_router, protect, protect_role};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
