use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents the identity record stored in the `public.users` table.
/// Identities are provisioned by the external auth provider; this service
/// only ever reads them, either by id (token validation) or by username
/// (the author-filtered post listing).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary Key, mirrors the id issued by the external auth provider.
    pub id: Uuid,
    // Unique handle used in author-filter URLs (/users/{username}/posts).
    pub username: String,
}

/// Post
///
/// Represents a single blog post from the `public.posts` table, augmented
/// with the author's username (a join against `users`).
///
/// Invariant: `author_id` is set once at creation from the authenticated
/// identity and is never altered by an update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    // FK to public.users.id (Owner). Sole identity allowed to mutate this post.
    pub author_id: Uuid,
    // Loaded via a JOIN in every repository query, so listings carry the
    // author handle without a second round trip.
    pub author_username: String,
    pub title: String,
    pub content: String,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreatePostRequest
///
/// Input payload for submitting a new post (POST /posts).
///
/// Deliberately has no author field: the author is always taken from the
/// authenticated identity, so a client cannot publish on someone else's
/// behalf.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

/// UpdatePostRequest
///
/// Partial update payload for modifying an existing post (PUT /posts/{id}).
/// Only `title` and `content` are editable; the author cannot be changed
/// through this payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// --- Response Schemas (Output) ---

/// PostPage
///
/// One page of a post listing. All listing endpoints return posts newest
/// first in fixed-size pages; the counters let a client render pagination
/// controls without a second request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostPage {
    pub posts: Vec<Post>,
    /// 1-based page number this response covers.
    pub page: i64,
    /// Total number of pages at the fixed page size (at least 1).
    pub total_pages: i64,
    /// Total number of posts matching the listing, across all pages.
    pub total_posts: i64,
}

/// AboutInfo
///
/// Static payload served by the informational endpoint (GET /about).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AboutInfo {
    pub title: String,
    pub description: String,
}
