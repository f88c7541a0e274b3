pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use std::str::FromStr;

pub async fn create_connection(database_url: &str) -> Result<SqlitePool> {
    let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePool::connect_with(connect_options).await?;

    // Run migrations
    migrations::run_migrations(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    // A single connection keeps every query on the same in-memory database.
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    migrations::run_migrations(&pool).await.expect("migrations");
    pool
}
