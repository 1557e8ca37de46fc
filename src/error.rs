use axum::{
    extract::multipart::MultipartError,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::json;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum DBError {
    #[error("A user with that username already exists.")]
    UsernameTaken,

    #[error("Not Found")]
    NotFound,
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Any error: {0:?}")]
    Anyhow(#[from] anyhow::Error),

    #[error("DB Error: {0:?}")]
    DBError(#[from] DBError),

    #[error("Login required to access {next}")]
    LoginRequired { next: String },

    #[error("Bad request: {0}")]
    BadRequest(&'static str),

    #[error("SQL failed: {0:?}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JWT error: {0:?}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Multipart error: {0:?}")]
    Multipart(#[from] MultipartError),

    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn not_found() -> Self {
        AppError::DBError(DBError::NotFound)
    }
}

/// Escaped inside a `next` value: everything but unreserved characters and `/`.
const NEXT_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Login redirect with the path (and query) the guest was trying to reach.
pub fn login_url(next: &str) -> String {
    format!("/auth/login/?next={}", utf8_percent_encode(next, NEXT_VALUE))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::LoginRequired { ref next } => {
                tracing::debug!("anonymous request for {next}, redirecting to login");
                return crate::api::found(&login_url(next));
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, Some(message.to_string())),
            AppError::Multipart(_) => (StatusCode::BAD_REQUEST, None),
            AppError::JwtError(_) => (StatusCode::UNAUTHORIZED, None),
            AppError::Sqlx(_) | AppError::Anyhow(_) | AppError::Io(_) => {
                tracing::error!("Error: {:?}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
            AppError::DBError(ref db_error) => {
                let message = db_error.to_string();

                match db_error {
                    DBError::NotFound => (StatusCode::NOT_FOUND, Some(message)),
                    DBError::UsernameTaken => (StatusCode::CONFLICT, Some(message)),
                }
            }
        };

        let body = Json(json!({
            "error": error_message.unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("Error").to_string()
            }),
        }));

        (status, [(header::CACHE_CONTROL, "no-cache")], body).into_response()
    }
}
