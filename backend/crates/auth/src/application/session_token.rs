//! Signed session token
//!
//! Cookie value format: `{session_id}.{base64url(HMAC-SHA256(secret, session_id))}`.
//! A value that fails to parse or verify is treated as "no session".

use hmac::{Hmac, Mac};
use platform::crypto::{from_base64url, to_base64url};
use sha2::Sha256;

use crate::domain::value_object::SessionId;
use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Sign a session id for the cookie
pub fn sign(secret: &[u8; 32], session_id: SessionId) -> AuthResult<String> {
    let session_id = session_id.to_string();
    let signature = mac(secret, &session_id)
        .map_err(|e| AuthError::Internal(format!("HMAC init failed: {e}")))?
        .finalize()
        .into_bytes();

    Ok(format!("{}.{}", session_id, to_base64url(&signature)))
}

/// Verify a cookie value and return the session id it names
pub fn verify(secret: &[u8; 32], token: &str) -> Option<SessionId> {
    let (session_id_str, signature_b64) = token.split_once('.')?;
    let signature = from_base64url(signature_b64).ok()?;

    mac(secret, session_id_str)
        .ok()?
        .verify_slice(&signature)
        .ok()?;

    session_id_str.parse().ok()
}

fn mac(secret: &[u8; 32], message: &str) -> Result<HmacSha256, hmac::digest::InvalidLength> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)?;
    mac.update(message.as_bytes());
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 32] = [7u8; 32];

    #[test]
    fn test_sign_then_verify() {
        let id = SessionId::new();
        let token = sign(&SECRET, id).unwrap();
        assert_eq!(verify(&SECRET, &token), Some(id));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign(&SECRET, SessionId::new()).unwrap();
        assert_eq!(verify(&[8u8; 32], &token), None);
    }

    #[test]
    fn test_tampered_id_rejected() {
        let token = sign(&SECRET, SessionId::new()).unwrap();
        let (_, sig) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", SessionId::new(), sig);
        assert_eq!(verify(&SECRET, &forged), None);
    }

    #[test]
    fn test_malformed_rejected() {
        assert_eq!(verify(&SECRET, ""), None);
        assert_eq!(verify(&SECRET, "no-dot"), None);
        assert_eq!(verify(&SECRET, "a.b.c"), None);
        assert_eq!(verify(&SECRET, "not-a-uuid.!!!"), None);
    }
}
