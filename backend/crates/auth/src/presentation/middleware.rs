//! Auth Middleware
//!
//! `require_session` guards any router that needs a logged-in caller;
//! `require_role` guards a router reserved for one role. Handlers read the result through
//! the [`CurrentSession`] extractor.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::{HeaderValue, Method, Request, StatusCode, header, request::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::client::ClientContext;
use platform::cookie::{delete_cookie_header, set_cookie_header};

use crate::application::anti_forgery;
use crate::application::authorize;
use crate::application::check_session::SessionCheck;
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::{Capability, IdentityId, LookupKey, Role};
use crate::error::{AuthError, AuthResult};
use crate::presentation::handlers::AuthAppState;

/// The caller's session, if `require_session` found one
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(Option<AuthSession>);

impl CurrentSession {
    pub fn new(session: Option<AuthSession>) -> Self {
        Self(session)
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.0.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.0.as_ref().map(|s| s.role)
    }

    pub fn identity_id(&self) -> Option<IdentityId> {
        self.0.as_ref().map(|s| s.identity_id)
    }

    pub fn lookup_key(&self) -> Option<&LookupKey> {
        self.0.as_ref().map(|s| &s.lookup_key)
    }

    pub fn require_capability(&self, capability: Capability) -> AuthResult<()> {
        authorize::require_capability(self.session(), capability)
    }

    pub fn require_role(&self, role: Role) -> AuthResult<()> {
        authorize::require_role(self.session(), role)
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Methods that never change state
fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Resolve a session cookie value. On failure the rejection is ready to send.
///
/// Takes the value rather than the request: `Body` is not `Sync`, so a
/// borrowed request held across the lookup would make the middleware
/// future `!Send`.
async fn resolve<R>(
    state: &AuthAppState<R>,
    token: Option<String>,
) -> Result<(AuthSession, Option<String>), Response>
where
    R: AuthRepository,
{
    let cookie = state.service.config().cookie();

    match state.service.check_session(token.as_deref()).await {
        Ok(SessionCheck::Active {
            session,
            rotated_token,
        }) => Ok((session, rotated_token)),
        Ok(SessionCheck::Expired) => {
            let mut response = AuthError::SessionExpired.into_response();
            response
                .headers_mut()
                .append(header::SET_COOKIE, delete_cookie_header(&cookie));
            Err(response)
        }
        Ok(SessionCheck::Missing) => Err(AuthError::Unauthenticated.into_response()),
        Err(e) => Err(e.into_response()),
    }
}

/// State-changing requests must echo the session's anti-forgery token
fn check_anti_forgery<R>(
    state: &AuthAppState<R>,
    session: &AuthSession,
    req: &Request<Body>,
) -> AuthResult<()>
where
    R: AuthRepository,
{
    if is_safe_method(req.method()) {
        return Ok(());
    }

    let candidate = req
        .headers()
        .get(state.service.config().anti_forgery_header.as_str())
        .and_then(|v| v.to_str().ok());

    anti_forgery::require(session, candidate)
}

/// Middleware that requires a valid auth session
pub async fn require_session<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: AuthRepository,
{
    let token = state.session_cookie(req.headers());
    let (session, rotated_token) = match resolve(&state, token).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    if let Err(e) = check_anti_forgery(&state, &session, &req) {
        return with_cookie(e.into_response(), rotated_token.as_deref(), &state);
    }

    req.extensions_mut().insert(CurrentSession(Some(session)));

    let response = next.run(req).await;
    with_cookie(response, rotated_token.as_deref(), &state)
}

/// Re-issue the cookie after rotation so the client follows the new id
pub(crate) fn with_cookie<R>(
    mut response: Response,
    token: Option<&str>,
    state: &AuthAppState<R>,
) -> Response
where
    R: AuthRepository,
{
    if let Some(token) = token {
        let cookie = state.service.config().cookie();
        response
            .headers_mut()
            .append(header::SET_COOKIE, set_cookie_header(&cookie, token));
    }
    response
}

/// State for [`require_role`]
pub struct RoleGuard<R>
where
    R: AuthRepository,
{
    pub state: AuthAppState<R>,
    pub role: Role,
}

impl<R> Clone for RoleGuard<R>
where
    R: AuthRepository,
{
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            role: self.role,
        }
    }
}

/// Middleware that admits only sessions of `guard.role`.
///
/// Does its own session resolution, so it is used instead of
/// `require_session`, not inside it. A caller with no session gets the
/// role's login page in `x-login-path`.
pub async fn require_role<R>(
    State(guard): State<RoleGuard<R>>,
    client: ClientContext,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: AuthRepository,
{
    let state = &guard.state;

    let token = state.session_cookie(req.headers());
    let (session, rotated_token) = match resolve(state, token).await {
        Ok(resolved) => resolved,
        Err(mut response) => {
            if response.status() == StatusCode::UNAUTHORIZED {
                response.headers_mut().insert(
                    "x-login-path",
                    HeaderValue::from_static(guard.role.login_path()),
                );
            }
            return response;
        }
    };

    if let Err(e) = authorize::require_role(Some(&session), guard.role) {
        state
            .service
            .record_access_denied(&session, &format!("{} area", guard.role), &client)
            .await;
        return with_cookie(e.into_response(), rotated_token.as_deref(), state);
    }

    if let Err(e) = check_anti_forgery(state, &session, &req) {
        return with_cookie(e.into_response(), rotated_token.as_deref(), state);
    }

    req.extensions_mut().insert(CurrentSession(Some(session)));

    let response = next.run(req).await;
    with_cookie(response, rotated_token.as_deref(), state)
}
