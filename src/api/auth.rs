use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    auth::{self, MaybeUser},
    db::{self, NewUser, User},
    error::{AppError, AppResult, DBError},
    forms::{BoundForm, FormErrors, LoginForm, SignupForm, INVALID_LOGIN, NON_FIELD},
};

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => "/",
    }
}

fn logged_in(user: &User, key: &EncodingKey, location: &str) -> AppResult<Response> {
    let token = auth::generate_jwt(user.id, key)?;

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, location.to_string()),
            (header::SET_COOKIE, auth::session_cookie(&token)),
        ],
    )
        .into_response())
}

// ================================================= LOGIN ================================================= //

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    next: Option<String>,
}

// GET /auth/login/
pub async fn login_form(
    Query(NextQuery { next }): Query<NextQuery>,
    MaybeUser(user): MaybeUser,
) -> impl IntoResponse {
    let form = LoginForm {
        next,
        ..LoginForm::default()
    };

    Json(json!({
        "form": BoundForm::unbound(form),
        "user": user.map(|user| user.username),
    }))
}

// POST /auth/login/
pub async fn login(
    State(pool): State<SqlitePool>,
    State(key): State<EncodingKey>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        let errors = FormErrors::from(&errors);
        return Ok(Json(json!({ "form": BoundForm::with_errors(form, errors) })).into_response());
    }

    let user = db::find_user_by_username(&pool, form.username.trim()).await?;
    let authenticated = match &user {
        Some(user) => auth::verify_password(&user.hash, &form.password)?,
        None => false,
    };

    let Some(user) = user.filter(|_| authenticated) else {
        tracing::debug!("failed login for {:?}", form.username);
        let mut errors = FormErrors::default();
        errors.add(NON_FIELD, INVALID_LOGIN);
        return Ok(Json(json!({ "form": BoundForm::with_errors(form, errors) })).into_response());
    };

    let next = form.next.as_deref().or(query.next.as_deref());
    logged_in(&user, &key, safe_next(next))
}

// GET /auth/logout/
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, auth::expired_session_cookie()),
        ],
    )
}

// ================================================= REGISTRATION ================================================= //

// GET /auth/signup/
pub async fn signup_form() -> impl IntoResponse {
    Json(json!({ "form": BoundForm::unbound(SignupForm::default()) }))
}

// POST /auth/signup/
pub async fn signup(
    State(pool): State<SqlitePool>,
    State(key): State<EncodingKey>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        let errors = FormErrors::from(&errors);
        return Ok(Json(json!({ "form": BoundForm::with_errors(form, errors) })).into_response());
    }

    let hash = auth::hash_password(&form.password)?;
    let created = db::create_user(
        &pool,
        NewUser {
            username: form.username.trim(),
            email: form.email.trim(),
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
            hash: &hash,
        },
    )
    .await;

    let user = match created {
        Ok(user) => user,
        Err(AppError::DBError(DBError::UsernameTaken)) => {
            let mut errors = FormErrors::default();
            errors.add("username", DBError::UsernameTaken.to_string());
            return Ok(Json(json!({ "form": BoundForm::with_errors(form, errors) })).into_response());
        }
        Err(err) => return Err(err),
    };

    tracing::info!("new account {}", user.username);
    logged_in(&user, &key, "/")
}
