//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Password hashing (Argon2id) with a dummy-hash path for unknown accounts
//! - Random token generation and constant-time comparison
//! - Cookie management
//! - Client request metadata (IP, User-Agent)
//! - Login lockout policy
//! - Injectable clock

pub mod client;
pub mod clock;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
