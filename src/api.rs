pub mod about;
pub mod auth;
pub mod comments;
pub mod follow;
pub mod posts;

use axum::{
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::{
    db::PostId,
    error::{AppError, AppResult},
};

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}

pub fn post_url(post_id: PostId) -> String {
    format!("/posts/{post_id}/")
}

/// Post ids in URLs that are not integers name no post.
fn parse_post_id(raw: &str) -> AppResult<PostId> {
    raw.parse().map_err(|_| AppError::not_found())
}

pub async fn handler_404(method: Method, uri: Uri) -> Response {
    let path = uri.path();
    let last_segment = path.rsplit('/').next().unwrap_or_default();

    if method == Method::GET && !path.ends_with('/') && !last_segment.contains('.') {
        let mut location = format!("{path}/");
        if let Some(query) = uri.query() {
            location.push('?');
            location.push_str(query);
        }
        return (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, location)],
        )
            .into_response();
    }

    AppError::not_found().into_response()
}
