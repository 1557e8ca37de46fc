use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::{AppError, AppResult, DBError};

pub type GroupId = i64;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
    pub slug: String,
    pub description: String,
}

pub async fn get_group_by_slug(pool: &SqlitePool, slug: &str) -> AppResult<Group> {
    sqlx::query_as::<_, Group>("SELECT * FROM post_groups WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::DBError(DBError::NotFound))
}

pub async fn list_groups(pool: &SqlitePool) -> AppResult<Vec<Group>> {
    let groups = sqlx::query_as::<_, Group>("SELECT * FROM post_groups ORDER BY title, id")
        .fetch_all(pool)
        .await?;

    Ok(groups)
}

pub async fn group_exists(pool: &SqlitePool, group_id: GroupId) -> AppResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM post_groups WHERE id = ?)",
    )
    .bind(group_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn create_group(
    pool: &SqlitePool,
    title: &str,
    slug: &str,
    description: &str,
) -> AppResult<Group> {
    let group = sqlx::query_as::<_, Group>(
        r#"
        INSERT INTO post_groups (title, slug, description)
        VALUES (?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(slug)
    .bind(description)
    .fetch_one(pool)
    .await?;

    Ok(group)
}
