use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible only to a validated identity. Every
/// handler here relies on the `AuthUser` extractor middleware being present
/// on the router layer above this module, which guarantees the handler
/// receives a resolved `AuthUser` used for the Owner-Only authorization
/// checks in `update_post` and `delete_post`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me/posts
        // Lists the requesting user's own posts, newest first.
        .route("/me/posts", get(handlers::get_my_posts))
        // POST /posts
        // Submits a new post. The author is always the requesting identity.
        .route("/posts", post(handlers::create_post))
        // PUT/DELETE /posts/{id}
        // Modify or remove an existing post. Both run the single
        // `authorize_mutation` ownership gate before touching anything;
        // a non-owner gets 403, and delete redirects to "/" on success.
        .route(
            "/posts/{id}",
            put(handlers::update_post).delete(handlers::delete_post),
        )
}
