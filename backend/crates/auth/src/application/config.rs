//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::rate_limit::LockoutPolicy;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Idle time after which a session is dead (1 hour)
    pub session_timeout: Duration,
    /// Age after which the session id is regenerated (30 minutes)
    pub rotation_interval: Duration,
    /// How long the id replaced by a rotation still resolves, for requests
    /// already in flight with the old cookie
    pub rotation_grace: Duration,
    /// Failed logins within `lockout_window` that lock a key
    pub max_login_attempts: u32,
    /// Rolling window for counting failed logins (15 minutes)
    pub lockout_window: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Request header carrying the anti-forgery token
    pub anti_forgery_header: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "jhub_session".to_string(),
            session_secret: [0u8; 32],
            session_timeout: Duration::from_secs(3600),
            rotation_interval: Duration::from_secs(1800),
            rotation_grace: Duration::from_secs(30),
            max_login_attempts: 5,
            lockout_window: Duration::from_secs(15 * 60),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            anti_forgery_header: "x-csrf-token".to_string(),
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    pub fn session_timeout_chrono(&self) -> chrono::Duration {
        to_chrono(self.session_timeout)
    }

    pub fn rotation_interval_chrono(&self) -> chrono::Duration {
        to_chrono(self.rotation_interval)
    }

    pub fn rotation_grace_chrono(&self) -> chrono::Duration {
        to_chrono(self.rotation_grace)
    }

    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: self.max_login_attempts,
            window: self.lockout_window,
        }
    }

    /// Session cookie (browser-session lifetime; the server enforces idle expiry)
    pub fn cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: None,
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.session_cookie_name, "jhub_session");
        assert_eq!(config.session_timeout_chrono(), chrono::Duration::seconds(3600));
        assert_eq!(config.rotation_interval_chrono(), chrono::Duration::seconds(1800));
        assert_eq!(config.rotation_grace_chrono(), chrono::Duration::seconds(30));
        assert_eq!(config.lockout_policy(), LockoutPolicy::default());
    }

    #[test]
    fn test_random_secret_differs() {
        let a = AuthConfig::with_random_secret();
        let b = AuthConfig::with_random_secret();
        assert_ne!(a.session_secret, b.session_secret);
        assert_ne!(a.session_secret, [0u8; 32]);
    }

    #[test]
    fn test_development_cookie_not_secure() {
        let cookie = AuthConfig::development().cookie();
        assert!(!cookie.secure);
        assert!(cookie.http_only);
        assert_eq!(cookie.name, "jhub_session");
    }
}
