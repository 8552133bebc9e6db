//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::domain::value_object::{Capability, IdentityId, Role};

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username, email or profile name depending on the role
    pub lookup_key: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub role: Role,
    pub identity_id: IdentityId,
    pub lookup_key: String,
    pub message: String,
    /// Where the client should go next
    pub dashboard_path: String,
    /// Echo this in the anti-forgery header on state-changing requests
    pub anti_forgery_token: String,
}

// ============================================================================
// Session Status
// ============================================================================

/// Session status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub role: Option<Role>,
    pub identity_id: Option<IdentityId>,
    pub lookup_key: Option<String>,
    pub capabilities: Vec<Capability>,
}

impl SessionStatusResponse {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            role: None,
            identity_id: None,
            lookup_key: None,
            capabilities: Vec::new(),
        }
    }
}

// ============================================================================
// Anti-Forgery
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AntiForgeryTokenResponse {
    pub anti_forgery_token: String,
}
