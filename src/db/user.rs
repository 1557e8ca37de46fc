use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::{AppError, AppResult, DBError};

pub type UserId = i64;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub hash: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub hash: &'a str,
}

pub async fn find_user(pool: &SqlitePool, user_id: UserId) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_user_by_username(pool: &SqlitePool, username: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> AppResult<User> {
    find_user_by_username(pool, username)
        .await?
        .ok_or(AppError::DBError(DBError::NotFound))
}

pub async fn create_user(pool: &SqlitePool, user: NewUser<'_>) -> AppResult<User> {
    let created = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, first_name, last_name, hash, date_joined)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await;

    match created {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            Err(DBError::UsernameTaken.into())
        }
        Err(err) => Err(err.into()),
    }
}
