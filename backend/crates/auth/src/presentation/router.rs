//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::application::service::AuthService;
use crate::domain::repository::AuthRepository;
use crate::domain::value_object::Role;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{RoleGuard, require_role, require_session};

/// Create the Auth router for any repository implementation
pub fn auth_router<R>(service: AuthService<R>) -> Router
where
    R: AuthRepository,
{
    let state = AuthAppState { service };

    let protected = Router::new()
        .route("/csrf-token", get(handlers::csrf_token))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session::<R>,
        ));

    Router::new()
        .route("/{role}/login", post(handlers::login::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .route("/session", get(handlers::session_status::<R>))
        .merge(protected)
        .with_state(state)
}

/// Wrap `router` so that every route needs a live session
pub fn protect<R>(router: Router, service: AuthService<R>) -> Router
where
    R: AuthRepository,
{
    router.route_layer(middleware::from_fn_with_state(
        AuthAppState { service },
        require_session::<R>,
    ))
}

/// Wrap `router` so that every route needs a live session of `role`
pub fn protect_role<R>(router: Router, service: AuthService<R>, role: Role) -> Router
where
    R: AuthRepository,
{
    let guard = RoleGuard {
        state: AuthAppState { service },
        role,
    };

    router.route_layer(middleware::from_fn_with_state(guard, require_role::<R>))
}
