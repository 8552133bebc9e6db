//! Value Object Module

pub mod anti_forgery_token;
pub mod capability;
pub mod identity_id;
pub mod lookup_key;
pub mod role;

pub use anti_forgery_token::AntiForgeryToken;
pub use capability::Capability;
pub use identity_id::IdentityId;
pub use lookup_key::{LookupKey, LookupKeyError};
pub use role::Role;
pub use kernel::id::SessionId;
