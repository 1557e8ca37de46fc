#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use quill::{
    auth,
    config::Config,
    db::{self, Group, NewPost, NewUser, PostId, User, UserId},
    routes, AppState,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const PER_PAGE: u32 = 10;
pub const MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;
const BOUNDARY: &str = "quill-test-boundary";

pub const SMALL_GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

/// A well-formed GIF padded out to `len` bytes.
pub fn gif_of_len(len: usize) -> Vec<u8> {
    let mut gif = SMALL_GIF[..SMALL_GIF.len() - 1].to_vec();
    gif.resize(len - 1, 0);
    gif.push(0x3B);
    gif
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    media_root: PathBuf,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
    }
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

impl TestApp {
    pub async fn new() -> Self {
        let media_root =
            std::env::temp_dir().join(format!("quill-test-media-{}", uuid::Uuid::new_v4()));
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            listen: "127.0.0.1:0".parse().unwrap(),
            jwt_secret: "integration-test-secret".to_string(),
            media_root: media_root.clone(),
            posts_per_page: PER_PAGE,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            index_cache_secs: 20,
        };

        let pool = db::connect_in_memory().await.unwrap();
        let state = AppState::new(pool, &config);
        let router = routes::generate_routes(state.clone());

        Self {
            state,
            router,
            media_root,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.state.pool
    }

    pub fn media_root(&self) -> &PathBuf {
        &self.media_root
    }

    /// A user that can only log in through a minted session.
    pub async fn create_user(&self, username: &str) -> User {
        db::create_user(
            self.pool(),
            NewUser {
                username,
                email: "",
                first_name: "",
                last_name: "",
                hash: "!",
            },
        )
        .await
        .unwrap()
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> Group {
        db::create_group(self.pool(), title, slug, "A group for tests")
            .await
            .unwrap()
    }

    pub async fn create_post(&self, author: &User, text: &str, group: Option<&Group>) -> PostId {
        db::create_post(
            self.pool(),
            NewPost {
                text,
                author_id: author.id,
                group_id: group.map(|group| group.id),
                image: None,
            },
        )
        .await
        .unwrap()
    }

    pub fn session(&self, user: &User) -> String {
        let token = auth::generate_jwt(user.id, self.state.encoding_key()).unwrap();
        format!("{}={token}", auth::SESSION_COOKIE)
    }

    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let body = hyper::body::to_bytes(body).await.unwrap();

        TestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, session: Option<&str>) -> TestResponse {
        let mut request = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = session {
            request = request.header(header::COOKIE, cookie);
        }
        self.request(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, session: Option<&str>) -> TestResponse {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = session {
            request = request.header(header::COOKIE, cookie);
        }
        self.request(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        parts: &[Part<'_>],
        session: Option<&str>,
    ) -> TestResponse {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = session {
            request = request.header(header::COOKIE, cookie);
        }
        self.request(request.body(Body::from(body)).unwrap()).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn count_follows(pool: &SqlitePool, user_id: UserId, author_id: UserId) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM follows WHERE user_id = ? AND author_id = ?",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
