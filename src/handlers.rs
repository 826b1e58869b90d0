use crate::{
    AppState,
    auth::{AuthUser, authorize_mutation},
    error::ApiError,
    models::{AboutInfo, CreatePostRequest, Post, PostPage, UpdatePostRequest, User},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Pagination ---

/// Fixed number of posts per listing page.
pub const PAGE_SIZE: i64 = 5;

/// PageQuery
///
/// Defines the accepted query parameters for the listing endpoints.
/// Used by Axum's Query extractor to safely bind HTTP query parameters.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    /// Optional 1-based page number; absent or out-of-range values are
    /// clamped to page 1.
    pub page: Option<i64>,
}

// Resolves the requested page to a (page, offset) pair. Page numbers are
// 1-based; zero and negative values clamp to the first page.
fn page_window(requested: Option<i64>) -> (i64, i64) {
    let page = requested.unwrap_or(1).max(1);
    (page, (page - 1) * PAGE_SIZE)
}

fn build_page(posts: Vec<Post>, page: i64, total_posts: i64) -> PostPage {
    // Ceiling division; an empty listing still reports one (empty) page.
    let total_pages = ((total_posts + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
    PostPage {
        posts,
        page,
        total_pages,
        total_posts,
    }
}

// --- Handlers ---

/// list_posts
///
/// [Public Route] One page of all posts, newest first.
#[utoipa::path(
    get,
    path = "/posts",
    params(PageQuery),
    responses((status = 200, description = "Page of posts", body = PostPage))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PostPage>, ApiError> {
    let (page, offset) = page_window(query.page);
    let posts = state.repo.list_posts(PAGE_SIZE, offset).await?;
    let total = state.repo.count_posts().await?;
    Ok(Json(build_page(posts, page, total)))
}

/// list_user_posts
///
/// [Public Route] One page of a single author's posts, newest first.
/// The username is resolved to a user first; an unknown username is a 404,
/// distinct from a known author with no posts (an empty page).
#[utoipa::path(
    get,
    path = "/users/{username}/posts",
    params(
        ("username" = String, Path, description = "Author username"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of the author's posts", body = PostPage),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PostPage>, ApiError> {
    let user = state
        .repo
        .get_user_by_username(&username)
        .await?
        .ok_or(ApiError::NotFound)?;

    let (page, offset) = page_window(query.page);
    let posts = state
        .repo
        .list_posts_by_author(user.id, PAGE_SIZE, offset)
        .await?;
    let total = state.repo.count_posts_by_author(user.id).await?;
    Ok(Json(build_page(posts, page, total)))
}

/// get_post_details
///
/// [Public Route] Retrieves a single post by ID.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let post = state.repo.get_post(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(post))
}

/// get_my_posts
///
/// [Authenticated Route] One page of the requesting user's own posts,
/// newest first. The identity is resolved via the `AuthUser` extractor.
#[utoipa::path(
    get,
    path = "/me/posts",
    params(PageQuery),
    responses((status = 200, description = "Page of my posts", body = PostPage))
)]
pub async fn get_my_posts(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PostPage>, ApiError> {
    let (page, offset) = page_window(query.page);
    let posts = state
        .repo
        .list_posts_by_author(user.id, PAGE_SIZE, offset)
        .await?;
    let total = state.repo.count_posts_by_author(user.id).await?;
    Ok(Json(build_page(posts, page, total)))
}

/// create_post
///
/// [Authenticated Route] Handles the submission of a new post. The author is
/// forcibly set to the authenticated identity; any author value a client
/// smuggles into the payload is ignored because the payload has no such
/// field.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let author = User {
        id: user.id,
        username: user.username.clone(),
    };
    let post = state
        .repo
        .create_post(&author, &payload.title, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Authenticated Route] Modifies a post's title/content.
///
/// *Authorization*: the post is fetched first (404 when absent), then the
/// `authorize_mutation` gate decides between proceeding and 403. The author
/// field is never altered by the update.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    let post = state.repo.get_post(id).await?.ok_or(ApiError::NotFound)?;

    if !authorize_mutation(&user, &post) {
        return Err(ApiError::Forbidden);
    }

    let updated = state
        .repo
        .update_post(id, payload.title.as_deref(), payload.content.as_deref())
        .await?
        // The post passed the fetch above, so this only triggers when it
        // vanished between the check and the update.
        .ok_or(ApiError::NotFound)?;

    Ok(Json(updated))
}

/// delete_post
///
/// [Authenticated Route] Removes a post, gated by the same
/// `authorize_mutation` check as update. On success the client is
/// redirected to the root listing.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 303, description = "Deleted, redirect to the root listing"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ApiError> {
    let post = state.repo.get_post(id).await?.ok_or(ApiError::NotFound)?;

    if !authorize_mutation(&user, &post) {
        return Err(ApiError::Forbidden);
    }

    if !state.repo.delete_post(id).await? {
        return Err(ApiError::NotFound);
    }

    Ok(Redirect::to("/"))
}

/// about
///
/// [Public Route] Static informational page data.
#[utoipa::path(
    get,
    path = "/about",
    responses((status = 200, description = "About this service", body = AboutInfo))
)]
pub async fn about() -> Json<AboutInfo> {
    Json(AboutInfo {
        title: "About".to_string(),
        description: "A simple blogging service: anyone can read posts, signed-in \
                      users can write their own."
            .to_string(),
    })
}
