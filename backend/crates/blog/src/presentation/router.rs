//! Blog Routers

use auth::{AccessGuard, require_access_token};
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::domain::repository::BlogStore;
use crate::presentation::handlers::{self, BlogAppState};

/// `/api/blogs` routes. Reads are public; writes need an access token.
pub fn blog_router<S>(state: BlogAppState<S>, guard: AccessGuard) -> Router
where
    S: BlogStore,
{
    let signed_in = || middleware::from_fn_with_state(guard.clone(), require_access_token);

    Router::new()
        .route(
            "/",
            get(handlers::list_posts::<S>)
                .merge(post(handlers::create_post::<S>).route_layer(signed_in())),
        )
        .route(
            "/{id}",
            get(handlers::get_post::<S>).merge(
                put(handlers::update_post::<S>)
                    .delete(handlers::delete_post::<S>)
                    .route_layer(signed_in()),
            ),
        )
        .route(
            "/{id}/comments",
            get(handlers::list_comments::<S>)
                .merge(post(handlers::add_comment::<S>).route_layer(signed_in())),
        )
        .route(
            "/{id}/comments/{comment_id}",
            delete(handlers::delete_comment::<S>).route_layer(signed_in()),
        )
        .route(
            "/{id}/reactions",
            post(handlers::react::<S>)
                .delete(handlers::remove_reaction::<S>)
                .route_layer(signed_in()),
        )
        .with_state(state)
}

/// `/api/ai` routes, all behind the access-token guard
pub fn ai_router<S>(state: BlogAppState<S>, guard: AccessGuard) -> Router
where
    S: BlogStore,
{
    Router::new()
        .route("/blog/generate", post(handlers::generate_draft::<S>))
        .route("/blog/improve", post(handlers::improve_draft::<S>))
        .route_layer(middleware::from_fn_with_state(guard, require_access_token))
        .with_state(state)
}
