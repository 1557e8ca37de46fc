mod user;
pub use user::*;
mod group;
pub use group::*;
mod post;
pub use post::*;
mod comment;
pub use comment::*;
mod follow;
pub use follow::*;

use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Executor, SqlitePool,
};

const MAX_POOL_SIZE: u32 = 5;

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(MAX_POOL_SIZE)
        .connect_with(options)
        .await
}

/// A private in-memory database. Every connection to `:memory:` opens a
/// fresh database, so the pool is pinned to a single connection that is
/// never recycled.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    prepare_db(&pool).await?;
    Ok(pool)
}

pub async fn prepare_db(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(include_str!("sql/schema.sql")).await?;
    Ok(())
}

