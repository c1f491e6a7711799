//! Shared helpers for HTTP-level integration tests.
//!
//! Builds the full application router (same middleware stack as `main.rs`)
//! on top of the per-test database pool provided by `#[sqlx::test]`, and
//! provides request/response plumbing via `tower::ServiceExt::oneshot`.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use atelier_api::auth::jwt::JwtConfig;
use atelier_api::auth::password::hash_password;
use atelier_api::config::ServerConfig;
use atelier_api::router::build_app_router;
use atelier_api::state::AppState;
use atelier_api::storage::MediaStore;
use atelier_db::models::application::{Application, CreateApplication};
use atelier_db::models::category::{Category, UpsertCategory};
use atelier_db::models::user::{CreateUser, User};
use atelier_db::repositories::{ApplicationRepo, CategoryRepo, UserRepo};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses a fixed JWT secret, a per-run temporary media root, and a 30-second
/// request timeout.
pub fn test_config() -> ServerConfig {
    let media_root =
        std::env::temp_dir().join(format!("atelier-test-media-{}", uuid::Uuid::new_v4()));
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        media_root,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This goes through the same [`build_app_router`] that production uses, so
/// tests exercise the identical middleware stack (CORS, request ID, timeout,
/// tracing, panic recovery, body limit).
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Like [`build_test_app`], but with a caller-supplied config (e.g. to pin
/// the media root and inspect stored files).
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let media = MediaStore::new(config.media_root.clone());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        media: Arc::new(media),
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, path: &str) -> Response {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, path: &str, token: &str) -> Response {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, path: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    path: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn put_json_auth(
    app: Router,
    path: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method("PUT")
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete_auth(app: Router, path: &str, token: &str) -> Response {
    let request = Request::builder()
        .method("DELETE")
        .uri(path)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Deserialize the response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be valid JSON")
}

// ---------------------------------------------------------------------------
// Multipart form builder
// ---------------------------------------------------------------------------

/// Minimal `multipart/form-data` body builder for upload endpoints.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("----test-boundary-{}", uuid::Uuid::new_v4()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn post_multipart_auth(
    app: Router,
    path: &str,
    form: MultipartForm,
    token: &str,
) -> Response {
    let (content_type, body) = form.finish();
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, content_type)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn put_multipart_auth(
    app: Router,
    path: &str,
    form: MultipartForm,
    token: &str,
) -> Response {
    let (content_type, body) = form.finish();
    let request = Request::builder()
        .method("PUT")
        .uri(path)
        .header(CONTENT_TYPE, content_type)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Create a user directly in the database. The password is [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, username: &str) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            first_name: "Иван".to_string(),
            last_name: "Петров".to_string(),
            email: format!("{username}@test.com"),
            password_hash,
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Create a user and grant the staff flag.
pub async fn create_admin(pool: &PgPool, username: &str) -> User {
    let user = create_user(pool, username).await;
    sqlx::query("UPDATE users SET is_staff = TRUE WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await
        .expect("staff grant should succeed");
    User {
        is_staff: true,
        ..user
    }
}

/// Log in via the API and return the access token.
pub async fn login(app: Router, username: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let json = body_json(response).await;
    json["access_token"]
        .as_str()
        .expect("login response must contain access_token")
        .to_string()
}

/// Seed a category directly through the repository.
pub async fn seed_category(pool: &PgPool, name: &str, slug: &str) -> Category {
    CategoryRepo::create(
        pool,
        &UpsertCategory {
            name: name.to_string(),
            slug: slug.to_string(),
        },
    )
    .await
    .expect("category creation should succeed")
}

/// Seed an application in status `new` directly through the repository.
pub async fn seed_application(
    pool: &PgPool,
    user_id: i64,
    category_id: i64,
    title: &str,
) -> Application {
    ApplicationRepo::create(
        pool,
        &CreateApplication {
            user_id,
            title: title.to_string(),
            category_id,
            image_path: format!("applications/seed/{title}.png"),
            description: "seeded".to_string(),
        },
    )
    .await
    .expect("application creation should succeed")
}

/// A tiny byte blob standing in for image data. Image validation looks at
/// the declared content type and size, not the bytes themselves.
pub fn fake_png() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\nfake-image-data".to_vec()
}
