//! Auth Routers

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use platform::image::MAX_IMAGE_BYTES;

use crate::domain::repository::AuthStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{require_access_token, require_admin};

/// Base64 inflates by 4/3; leave room for the JSON envelope
const AVATAR_BODY_LIMIT: usize = MAX_IMAGE_BYTES / 3 * 4 + 64 * 1024;

/// `/api/auth` routes
pub fn auth_router<R>(state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    Router::new()
        .route("/register", post(handlers::register::<R>))
        .route("/login", post(handlers::login::<R>))
        .route("/refresh", post(handlers::refresh::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .route("/otp/request", post(handlers::request_otp::<R>))
        .route("/otp/verify", post(handlers::verify_otp::<R>))
        .route("/forgot-password", post(handlers::forgot_password::<R>))
        .route("/reset-password", post(handlers::reset_password::<R>))
        .with_state(state)
}

/// `/api/users` routes, all behind the access-token guard
pub fn users_router<R>(state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    let guard = state.access_guard();

    let admin = Router::new()
        .route("/{id}/role", put(handlers::change_role::<R>))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route(
            "/me",
            get(handlers::get_me::<R>).put(handlers::update_me::<R>),
        )
        .route("/me/password", post(handlers::change_password::<R>))
        .route(
            "/me/avatar",
            post(handlers::upload_avatar::<R>).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(guard, require_access_token))
        .with_state(state)
}
