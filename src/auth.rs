use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    headers::{Cookie, HeaderMapExt},
    http::{request::Parts, HeaderMap},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{self, User, UserId},
    error::{AppError, AppResult},
};

pub const SESSION_COOKIE: &str = "token";
const SESSION_DAYS: i64 = 30;

/// Payload of a session token: who is logged in and until when.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: UserId,
    exp: i64,
}

pub fn generate_jwt(user_id: UserId, key: &EncodingKey) -> AppResult<String> {
    let claims = SessionClaims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp(),
    };

    Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, key)?)
}

/// The user a session token belongs to. Expired, forged or non-HS256 tokens
/// are errors.
pub fn verify_token(token: &str, key: &DecodingKey) -> AppResult<UserId> {
    let validation = Validation::new(Algorithm::HS256);
    let data = jsonwebtoken::decode::<SessionClaims>(token, key, &validation)?;
    Ok(data.claims.sub)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!(err))?;

    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let hash = PasswordHash::new(hash).map_err(|err| anyhow::anyhow!(err))?;

    match Argon2::default().verify_password(password.as_bytes(), &hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow::anyhow!(err).into()),
    }
}

pub fn session_cookie(token: &str) -> String {
    let max_age = chrono::Duration::days(SESSION_DAYS).num_seconds();
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_string))
        .filter(|token| !token.is_empty())
}

// =================== EXTRACTORS =================== //

/// The logged-in user, if any. Invalid or expired sessions count as
/// anonymous.
#[derive(Debug)]
pub struct MaybeUser(pub Option<User>);

/// A logged-in user. Guests are redirected to the login page.
#[derive(Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
    DecodingKey: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };

        let key = DecodingKey::from_ref(state);
        let user_id = match verify_token(&token, &key) {
            Ok(user_id) => user_id,
            Err(err) => {
                tracing::debug!("ignoring session token: {err:?}");
                return Ok(MaybeUser(None));
            }
        };

        let pool = SqlitePool::from_ref(state);
        Ok(MaybeUser(db::find_user(&pool, user_id).await?))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
    DecodingKey: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(CurrentUser(user)),
            MaybeUser(None) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map_or_else(|| parts.uri.path(), |path| path.as_str());
                Err(AppError::LoginRequired {
                    next: next.to_string(),
                })
            }
        }
    }
}
