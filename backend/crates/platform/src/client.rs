//! Client identification utilities
//!
//! Request metadata recorded alongside audit events.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, header, request::Parts};

/// Longest User-Agent kept for audit rows
const MAX_USER_AGENT_LEN: usize = 512;

/// Who is on the other end of a request, as far as headers tell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub ip: Option<IpAddr>,
    /// User-Agent header, truncated
    pub user_agent: Option<String>,
}

impl ClientContext {
    /// Build from headers plus the socket address when the server exposes it
    pub fn from_headers(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect());

        Self {
            ip: extract_client_ip(headers, direct_ip),
            user_agent,
        }
    }

    /// Get IP as string (for database storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        Ok(Self::from_headers(&parts.headers, direct_ip))
    }
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(direct)), Some(direct));
    }

    #[test]
    fn test_garbage_xff_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        let direct: IpAddr = "10.1.2.3".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(direct)), Some(direct));
    }

    #[test]
    fn test_user_agent_truncated() {
        let mut headers = HeaderMap::new();
        let long = "x".repeat(2 * MAX_USER_AGENT_LEN);
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&long).unwrap());

        let ctx = ClientContext::from_headers(&headers, None);
        assert_eq!(ctx.user_agent.unwrap().len(), MAX_USER_AGENT_LEN);
        assert!(ctx.ip.is_none());
    }

    #[tokio::test]
    async fn test_extractor_reads_connect_info() {
        let addr: SocketAddr = "203.0.113.9:5000".parse().unwrap();
        let (mut parts, _) = Request::builder()
            .header(header::USER_AGENT, "Mozilla/5.0 Test")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(ConnectInfo(addr));

        let ctx = ClientContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.ip, Some(addr.ip()));
        assert_eq!(ctx.user_agent.as_deref(), Some("Mozilla/5.0 Test"));
    }
}
