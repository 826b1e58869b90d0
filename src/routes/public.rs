use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client. Every post in the system is publicly readable, so the read
/// endpoints need no visibility filtering; the write paths live in the
/// authenticated router.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness endpoint used for monitoring and load
        // balancer checks.
        .route("/health", get(|| async { "ok" }))
        // GET /about
        // Static informational payload (title "About").
        .route("/about", get(handlers::about))
        // GET /posts?page=N
        // Pages through all posts, newest first, five per page.
        .route("/posts", get(handlers::list_posts))
        // GET /posts/{id}
        // Retrieves a single post; 404 when the id is unknown.
        .route("/posts/{id}", get(handlers::get_post_details))
        // GET /users/{username}/posts?page=N
        // Pages through one author's posts, newest first. An unknown
        // username is a 404 before any listing happens.
        .route("/users/{username}/posts", get(handlers::list_user_posts))
}
