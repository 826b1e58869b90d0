use crate::models::{Post, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers to interact with the data layer without knowing the specific
/// implementation (Postgres, in-memory, etc.).
///
/// Every listing method takes an explicit `limit`/`offset` window and MUST
/// return posts ordered by `created_at` descending. The ordering is part of
/// the contract, not an implementation detail: a customized query that drops
/// it is a bug.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Post Retrieval ---
    // Unfiltered listing, newest first.
    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error>;
    async fn count_posts(&self) -> Result<i64, sqlx::Error>;

    // Listing restricted to a single author, newest first.
    async fn list_posts_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error>;
    async fn count_posts_by_author(&self, author_id: Uuid) -> Result<i64, sqlx::Error>;

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error>;

    // --- Post Mutations ---
    // The author of the new post is exactly `author`; callers pass the
    // authenticated identity, never client-supplied data.
    async fn create_post(
        &self,
        author: &User,
        title: &str,
        content: &str,
    ) -> Result<Post, sqlx::Error>;
    // Touches title/content only. Ownership is checked by the caller before
    // this is invoked; the author column is never part of the UPDATE.
    async fn update_post(
        &self,
        id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Post>, sqlx::Error>;
    // Returns true if a row was removed.
    async fn delete_post(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- User/Auth ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

// Column list shared by every post query: the author's username is joined in
// so a `Post` row is complete without a second lookup.
const POST_COLUMNS: &str = "p.id, p.author_id, u.username AS author_username, \
                            p.title, p.content, p.created_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database. Queries are runtime-checked (`sqlx::query_as` with
/// explicit binds) against the `posts` and `users` tables.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_posts
    ///
    /// One page of the global listing. `ORDER BY created_at DESC` is stated
    /// explicitly here and in every other listing query.
    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {POST_COLUMNS} \
             FROM posts p JOIN users u ON p.author_id = u.id \
             ORDER BY p.created_at DESC \
             LIMIT $1 OFFSET $2"
        );

        sqlx::query_as::<_, Post>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn count_posts(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
    }

    /// list_posts_by_author
    ///
    /// One page of a single author's posts. The author filter customizes the
    /// base query, so the ordering clause is re-stated rather than inherited.
    async fn list_posts_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {POST_COLUMNS} \
             FROM posts p JOIN users u ON p.author_id = u.id \
             WHERE p.author_id = $1 \
             ORDER BY p.created_at DESC \
             LIMIT $2 OFFSET $3"
        );

        sqlx::query_as::<_, Post>(&query)
            .bind(author_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn count_posts_by_author(&self, author_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {POST_COLUMNS} \
             FROM posts p JOIN users u ON p.author_id = u.id \
             WHERE p.id = $1"
        );

        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// create_post
    ///
    /// Inserts a new post owned by `author`. Uses a CTE so the insert and the
    /// username join happen in one round trip.
    async fn create_post(
        &self,
        author: &User,
        title: &str,
        content: &str,
    ) -> Result<Post, sqlx::Error> {
        let new_id = Uuid::new_v4();

        sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (id, author_id, title, content, created_at)
                VALUES ($1, $2, $3, $4, NOW())
                RETURNING id, author_id, title, content, created_at
            )
            SELECT i.id, i.author_id, u.username AS author_username,
                   i.title, i.content, i.created_at
            FROM inserted i JOIN users u ON i.author_id = u.id
            "#,
        )
        .bind(new_id)
        .bind(author.id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    /// update_post
    ///
    /// Updates title/content via COALESCE so an omitted field keeps its
    /// current value. The author column is deliberately absent from the SET
    /// list. Returns None when no post with this id exists.
    async fn update_post(
        &self,
        id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            WITH updated AS (
                UPDATE posts
                SET title = COALESCE($2, title),
                    content = COALESCE($3, content)
                WHERE id = $1
                RETURNING id, author_id, title, content, created_at
            )
            SELECT up.id, up.author_id, u.username AS author_username,
                   up.title, up.content, up.created_at
            FROM updated up JOIN users u ON up.author_id = u.id
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// get_user
    ///
    /// Retrieves the identity record needed during token validation.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// get_user_by_username
    ///
    /// Resolves the `{username}` path segment of the author-filtered listing.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }
}

// --- In-Memory Implementation ---

/// MemoryRepository
///
/// A `Repository` backed by maps behind a `tokio::sync::RwLock`. Used by the
/// integration tests and as a zero-dependency store for local experiments.
/// Semantics match `PostgresRepository`: listings are newest first, creation
/// stamps the current time, updates never touch the author.
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<MemoryStore>,
}

#[derive(Default)]
struct MemoryStore {
    users: HashMap<Uuid, User>,
    // Insertion order is retained so that posts created within the same
    // timestamp tick still list newest-insertion first.
    posts: Vec<Post>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an identity record, standing in for the external auth
    /// provider's provisioning step.
    pub async fn insert_user(&self, user: User) {
        self.inner.write().await.users.insert(user.id, user);
    }
}

// Newest first: descending creation time, ties broken by reverse insertion
// order (the input iterates reversed and the sort is stable).
fn sorted_newest_first(posts: &[Post]) -> Vec<Post> {
    let mut sorted: Vec<Post> = posts.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error> {
        let store = self.inner.read().await;
        Ok(sorted_newest_first(&store.posts)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_posts(&self) -> Result<i64, sqlx::Error> {
        Ok(self.inner.read().await.posts.len() as i64)
    }

    async fn list_posts_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let store = self.inner.read().await;
        Ok(sorted_newest_first(&store.posts)
            .into_iter()
            .filter(|p| p.author_id == author_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_posts_by_author(&self, author_id: Uuid) -> Result<i64, sqlx::Error> {
        let store = self.inner.read().await;
        Ok(store
            .posts
            .iter()
            .filter(|p| p.author_id == author_id)
            .count() as i64)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        let store = self.inner.read().await;
        Ok(store.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(
        &self,
        author: &User,
        title: &str,
        content: &str,
    ) -> Result<Post, sqlx::Error> {
        let post = Post {
            id: Uuid::new_v4(),
            author_id: author.id,
            author_username: author.username.clone(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };

        self.inner.write().await.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(
        &self,
        id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Post>, sqlx::Error> {
        let mut store = self.inner.write().await;
        let Some(post) = store.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(title) = title {
            post.title = title.to_string();
        }
        if let Some(content) = content {
            post.content = content.to_string();
        }

        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut store = self.inner.write().await;
        let before = store.posts.len();
        store.posts.retain(|p| p.id != id);
        Ok(store.posts.len() < before)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let store = self.inner.read().await;
        Ok(store
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}
