//! Database access layer: connection pool, row models, and repositories.
//!
//! Repositories are stateless structs with static async methods taking a
//! pool or connection, using runtime queries (no compile-time sqlx macros)
//! so the crate builds without a live database. Embeddings live in a
//! pgvector `vector(512)` column and are cast to/from text literals in SQL.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Cheap connectivity probe.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
