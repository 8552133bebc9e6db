//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" shared by the tracker backend:
//! - Unified error type ([`error::app_error::AppError`]) and its HTTP classification
//! - Typed UUID identifiers for server-side records
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
