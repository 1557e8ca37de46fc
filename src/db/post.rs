use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::{
    error::{AppError, AppResult, DBError},
    media,
    pagination::{Page, Paginator},
};

use super::{GroupId, UserId};

pub type PostId = i64;

const POST_SELECT: &str = r#"
    SELECT
        posts.id,
        posts.text,
        posts.pub_date,
        posts.image,
        posts.author_id,
        users.username AS author_username,
        posts.group_id,
        post_groups.slug AS group_slug,
        post_groups.title AS group_title
    FROM posts
    INNER JOIN users ON users.id = posts.author_id
    LEFT JOIN post_groups ON post_groups.id = posts.group_id
"#;

#[derive(Debug, FromRow)]
struct PostRow {
    id: PostId,
    text: String,
    pub_date: DateTime<Utc>,
    image: Option<String>,
    author_id: UserId,
    author_username: String,
    group_id: Option<GroupId>,
    group_slug: Option<String>,
    group_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: PostId,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: PostAuthor,
    pub group: Option<PostGroup>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostAuthor {
    #[serde(skip)]
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostGroup {
    pub id: GroupId,
    pub slug: String,
    pub title: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let group = match (row.group_id, row.group_slug, row.group_title) {
            (Some(id), Some(slug), Some(title)) => Some(PostGroup { id, slug, title }),
            _ => None,
        };

        Post {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            author: PostAuthor {
                id: row.author_id,
                username: row.author_username,
            },
            group,
            image: row.image.as_deref().map(media::media_url),
        }
    }
}

/// Which posts a listing covers. Every listing shares the global ordering.
#[derive(Debug, Clone, Copy)]
pub enum PostFilter {
    All,
    Group(GroupId),
    Author(UserId),
    FollowedBy(UserId),
}

impl PostFilter {
    fn clause(self) -> (&'static str, Option<i64>) {
        match self {
            PostFilter::All => ("", None),
            PostFilter::Group(id) => ("WHERE posts.group_id = ?", Some(id)),
            PostFilter::Author(id) => ("WHERE posts.author_id = ?", Some(id)),
            PostFilter::FollowedBy(id) => (
                "WHERE posts.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)",
                Some(id),
            ),
        }
    }
}

pub async fn count_posts(pool: &SqlitePool, filter: PostFilter) -> AppResult<u64> {
    let (clause, param) = filter.clause();
    let sql = format!("SELECT COUNT(*) FROM posts {clause}");

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    if let Some(param) = param {
        query = query.bind(param);
    }

    Ok(query.fetch_one(pool).await?.max(0) as u64)
}

pub async fn list_posts(
    pool: &SqlitePool,
    filter: PostFilter,
    requested_page: Option<&str>,
    per_page: u32,
) -> AppResult<Page<Post>> {
    let paginator = Paginator::new(count_posts(pool, filter).await?, per_page);
    let window = paginator.window(paginator.resolve(requested_page));

    let (clause, param) = filter.clause();
    let sql = format!(
        "{POST_SELECT} {clause} ORDER BY posts.pub_date DESC, posts.id DESC LIMIT ? OFFSET ?"
    );

    let mut query = sqlx::query_as::<_, PostRow>(&sql);
    if let Some(param) = param {
        query = query.bind(param);
    }

    let rows = query
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(pool)
        .await?;

    Ok(paginator.page(window, rows.into_iter().map(Post::from).collect()))
}

pub async fn get_post(pool: &SqlitePool, post_id: PostId) -> AppResult<Post> {
    let sql = format!("{POST_SELECT} WHERE posts.id = ?");

    sqlx::query_as::<_, PostRow>(&sql)
        .bind(post_id)
        .fetch_optional(pool)
        .await?
        .map(Post::from)
        .ok_or(AppError::DBError(DBError::NotFound))
}

#[derive(Debug)]
pub struct NewPost<'a> {
    pub text: &'a str,
    pub author_id: UserId,
    pub group_id: Option<GroupId>,
    pub image: Option<&'a str>,
}

pub async fn create_post(pool: &SqlitePool, post: NewPost<'_>) -> AppResult<PostId> {
    let id = sqlx::query_scalar::<_, PostId>(
        r#"
        INSERT INTO posts (text, pub_date, author_id, group_id, image)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(post.text)
    .bind(Utc::now())
    .bind(post.author_id)
    .bind(post.group_id)
    .bind(post.image)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Author and publication date never change; a `None` image keeps the
/// stored one.
pub async fn update_post(
    pool: &SqlitePool,
    post_id: PostId,
    text: &str,
    group_id: Option<GroupId>,
    image: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE posts
        SET text = ?, group_id = ?, image = COALESCE(?, image)
        WHERE id = ?
        "#,
    )
    .bind(text)
    .bind(group_id)
    .bind(image)
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(())
}
