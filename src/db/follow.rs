use sqlx::SqlitePool;

use crate::error::AppResult;

use super::UserId;

/// Returns whether a new edge was written. Self-follows and repeats are
/// no-ops; the table's unique and check constraints back this up.
pub async fn follow(pool: &SqlitePool, user_id: UserId, author_id: UserId) -> AppResult<bool> {
    if user_id == author_id {
        return Ok(false);
    }

    let result = sqlx::query(
        "
        INSERT INTO follows (user_id, author_id)
        VALUES (?, ?)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn unfollow(pool: &SqlitePool, user_id: UserId, author_id: UserId) -> AppResult<bool> {
    let result = sqlx::query(
        "
        DELETE FROM follows
        WHERE user_id = ? AND author_id = ?
        ",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_following(
    pool: &SqlitePool,
    user_id: UserId,
    author_id: UserId,
) -> AppResult<bool> {
    let following = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = ? AND author_id = ?)",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_one(pool)
    .await?;

    Ok(following)
}
