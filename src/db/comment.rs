use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::AppResult;

use super::{PostId, UserId};

#[derive(Debug, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    #[serde(skip)]
    pub post_id: PostId,
    pub author: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

pub async fn list_comments(pool: &SqlitePool, post_id: PostId) -> AppResult<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT
            comments.id,
            comments.post_id,
            users.username AS author,
            comments.text,
            comments.created
        FROM comments
        INNER JOIN users ON users.id = comments.author_id
        WHERE comments.post_id = ?
        ORDER BY comments.id
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

pub async fn create_comment(
    pool: &SqlitePool,
    post_id: PostId,
    author_id: UserId,
    text: &str,
) -> AppResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO comments (post_id, author_id, text, created)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(text)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(id)
}
