//! Application Layer
//!
//! Use cases and application services.

pub mod anti_forgery;
pub mod authorize;
pub mod check_session;
pub mod config;
pub mod service;
pub mod session_token;
pub mod sign_in;
pub mod sign_out;

// Re-exports
pub use check_session::{CheckSessionUseCase, SessionCheck};
pub use config::AuthConfig;
pub use service::AuthService;
pub use sign_in::{LoginResult, SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
