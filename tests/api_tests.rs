use blog_api::{
    AppState,
    auth::Claims,
    config::AppConfig,
    create_router,
    models::{Post, PostPage, User},
    repository::{MemoryRepository, Repository, RepositoryState},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::net::TcpListener;
use uuid::Uuid;

// End-to-end tests: the real router with all middleware layers, served on a
// loopback port, driven over HTTP. The store is the in-memory repository so
// the suite runs without external services.

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
    pub config: AppConfig,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    let config = AppConfig::default();

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        config: config.clone(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        config,
    }
}

impl TestApp {
    // Stands in for the external identity provider: the user exists in the
    // store, and requests authenticate with the Local-env bypass header.
    async fn register_user(&self, name: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: name.to_string(),
        };
        self.repo.insert_user(user.clone()).await;
        user
    }
}

fn bearer_token(config: &AppConfig, user_id: Uuid) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .unwrap()
}

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_about_page() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/about", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["title"], "About");
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/posts", app.address))
        .json(&serde_json::json!({ "title": "Hello", "content": "World" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_post_detail_not_found() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/posts/{}", app.address, Uuid::new_v4()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unknown_author_listing_not_found() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/users/nobody/posts", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_post_lifecycle_over_http() {
    let app = spawn_app().await;
    // Redirects must stay observable: the delete response is a 303 pointing
    // at the root listing, not the page it points to.
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    // Create as alice. The payload smuggles author fields; they are ignored
    // and the author is the authenticated identity.
    let response = client
        .post(format!("{}/posts", app.address))
        .header("x-user-id", alice.id.to_string())
        .json(&serde_json::json!({
            "title": "Hello",
            "content": "World",
            "author_username": "mallory",
            "author_id": Uuid::new_v4(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let post: Post = response.json().await.unwrap();
    assert_eq!(post.author_id, alice.id);
    assert_eq!(post.author_username, "alice");

    // Update as bob: forbidden.
    let response = client
        .put(format!("{}/posts/{}", app.address, post.id))
        .header("x-user-id", bob.id.to_string())
        .json(&serde_json::json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Update as alice: succeeds, author untouched.
    let response = client
        .put(format!("{}/posts/{}", app.address, post.id))
        .header("x-user-id", alice.id.to_string())
        .json(&serde_json::json!({ "title": "Hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let updated: Post = response.json().await.unwrap();
    assert_eq!(updated.title, "Hi");
    assert_eq!(updated.content, "World");
    assert_eq!(updated.author_username, "alice");

    // Delete as bob: forbidden.
    let response = client
        .delete(format!("{}/posts/{}", app.address, post.id))
        .header("x-user-id", bob.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Delete as alice: redirect to the root listing.
    let response = client
        .delete(format!("{}/posts/{}", app.address, post.id))
        .header("x-user-id", alice.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 303);
    assert_eq!(
        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/")
    );

    // The post is gone.
    let response = client
        .get(format!("{}/posts/{}", app.address, post.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_listing_pagination_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = app.register_user("alice").await;
    for i in 0..7 {
        app.repo
            .create_post(&alice, &format!("post {i}"), "body")
            .await
            .unwrap();
    }

    let first: PostPage = client
        .get(format!("{}/posts", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first.page, 1);
    assert_eq!(first.posts.len(), 5);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.total_posts, 7);
    assert_eq!(first.posts[0].title, "post 6");

    let second: PostPage = client
        .get(format!("{}/posts?page=2", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second.page, 2);
    assert_eq!(second.posts.len(), 2);
    assert_eq!(second.posts[1].title, "post 0");
}

#[tokio::test]
async fn test_author_filtered_listing_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    app.repo.create_post(&alice, "a1", "x").await.unwrap();
    app.repo.create_post(&bob, "b1", "x").await.unwrap();
    app.repo.create_post(&alice, "a2", "x").await.unwrap();

    let page: PostPage = client
        .get(format!("{}/users/alice/posts", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(page.total_posts, 2);
    assert!(page.posts.iter().all(|p| p.author_username == "alice"));
    assert_eq!(page.posts[0].title, "a2");
}

#[tokio::test]
async fn test_my_posts_with_bearer_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    app.repo.create_post(&alice, "mine", "x").await.unwrap();
    app.repo.create_post(&bob, "theirs", "x").await.unwrap();

    // Authenticate with a real bearer token rather than the dev bypass.
    let token = bearer_token(&app.config, alice.id);
    let page: PostPage = client
        .get(format!("{}/me/posts", app.address))
        .header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", token),
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(page.total_posts, 1);
    assert_eq!(page.posts[0].title, "mine");
}
