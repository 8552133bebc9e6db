//! Entity Module

pub mod activity;
pub mod auth_session;
pub mod failed_attempt;
pub mod identity;
