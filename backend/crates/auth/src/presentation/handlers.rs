//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use platform::client::ClientContext;
use platform::cookie::{delete_cookie_header, extract_cookie, set_cookie_header};

use crate::application::anti_forgery;
use crate::application::check_session::SessionCheck;
use crate::application::service::AuthService;
use crate::domain::policy;
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::Role;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AntiForgeryTokenResponse, LoginRequest, LoginResponse, SessionStatusResponse,
};
use crate::presentation::middleware::{CurrentSession, with_cookie};

/// Shared state for auth handlers
pub struct AuthAppState<R>
where
    R: AuthRepository,
{
    pub service: AuthService<R>,
}

impl<R> Clone for AuthAppState<R>
where
    R: AuthRepository,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<R> AuthAppState<R>
where
    R: AuthRepository,
{
    pub(crate) fn session_cookie(&self, headers: &HeaderMap) -> Option<String> {
        extract_cookie(headers, &self.service.config().session_cookie_name)
    }
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/{role}/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    Path(role): Path<String>,
    client: ClientContext,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Response>
where
    R: AuthRepository,
{
    let role = role
        .parse::<Role>()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let output = state
        .service
        .login(role, req.lookup_key, req.password, &client)
        .await?
        .into_result()?;

    // One session per client: a successful login replaces whatever was there
    if let Some(existing) = state.session_cookie(&headers) {
        state.service.logout(Some(&existing), &client).await?;
    }

    let cookie = set_cookie_header(&state.service.config().cookie(), &output.session_token);
    let session = output.session;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            role: session.role,
            identity_id: session.identity_id,
            lookup_key: session.lookup_key.original().to_string(),
            message: "Login successful. Welcome back!".to_string(),
            dashboard_path: role.dashboard_path().to_string(),
            anti_forgery_token: anti_forgery::issue(&session).to_string(),
        }),
    )
        .into_response())
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    client: ClientContext,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: AuthRepository,
{
    let config = state.service.config();
    let token = state.session_cookie(&headers);

    let check = state.service.check_session(token.as_deref()).await?;

    if let SessionCheck::Active {
        session,
        rotated_token,
    } = check
    {
        let candidate = headers
            .get(config.anti_forgery_header.as_str())
            .and_then(|v| v.to_str().ok());
        if let Err(e) = anti_forgery::require(&session, candidate) {
            // The session survives, so the client must still follow a rotation
            return Ok(with_cookie(e.into_response(), rotated_token.as_deref(), &state));
        }

        let live_token = rotated_token.or(token);
        state.service.logout(live_token.as_deref(), &client).await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, delete_cookie_header(&config.cookie()))],
    )
        .into_response())
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/session
pub async fn session_status<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: AuthRepository,
{
    let cookie = state.service.config().cookie();
    let token = state.session_cookie(&headers);
    let had_cookie = token.is_some();

    match state.service.check_session(token.as_deref()).await? {
        SessionCheck::Active {
            session,
            rotated_token,
        } => {
            let body = Json(SessionStatusResponse {
                authenticated: true,
                role: Some(session.role),
                identity_id: Some(session.identity_id),
                lookup_key: Some(session.lookup_key.original().to_string()),
                capabilities: policy::capabilities(session.role).to_vec(),
            });

            let mut response = body.into_response();
            if let Some(token) = rotated_token {
                response
                    .headers_mut()
                    .append(header::SET_COOKIE, set_cookie_header(&cookie, &token));
            }
            Ok(response)
        }
        SessionCheck::Expired | SessionCheck::Missing => {
            let mut response = Json(SessionStatusResponse::anonymous()).into_response();
            if had_cookie {
                response
                    .headers_mut()
                    .append(header::SET_COOKIE, delete_cookie_header(&cookie));
            }
            Ok(response)
        }
    }
}

// ============================================================================
// Anti-Forgery Token (requires authentication)
// ============================================================================

/// GET /api/auth/csrf-token
pub async fn csrf_token(current: CurrentSession) -> AuthResult<Json<AntiForgeryTokenResponse>> {
    let session = current.session().ok_or(AuthError::Unauthenticated)?;

    Ok(Json(AntiForgeryTokenResponse {
        anti_forgery_token: anti_forgery::issue(session).to_string(),
    }))
}
